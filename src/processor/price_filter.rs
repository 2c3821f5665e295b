use crate::models::Product;
use crate::processor::product_normalizer::parse_price_digits;

/// Keeps products whose numeric price lies in `[min, max]`. Without bounds the
/// input is returned untouched.
pub fn filter_by_price(
    products: Vec<Product>,
    min_price: Option<u64>,
    max_price: Option<u64>,
) -> Vec<Product> {
    if min_price.is_none() && max_price.is_none() {
        return products;
    }

    products
        .into_iter()
        .filter(|product| match parse_price_digits(&product.price) {
            Some(price) => {
                min_price.is_none_or(|min| price >= min) && max_price.is_none_or(|max| price <= max)
            }
            None => false,
        })
        .collect()
}
