use chrono::Utc;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::config::ScrapingConfig;
use crate::models::{Product, ScrapingParams, Site};
use crate::processor::product_normalizer::{format_price, group_digits, stock_image};
use crate::processor::relevance::{REASON_AI, REASON_CATEGORY};

pub const MAX_MOCK_PRODUCTS: usize = 12;
pub const REASON_PRICE_OPTIMIZED: &str = "price_optimized";

const PRICE_VARIATION: f64 = 0.3;

const IPHONE_CATALOG: [&str; 10] = [
    "Apple iPhone 15 (128 GB) - Black",
    "Apple iPhone 15 Plus (128 GB) - Blue",
    "Apple iPhone 15 Pro (256 GB) - Natural Titanium",
    "Apple iPhone 15 Pro Max (256 GB) - Blue Titanium",
    "Apple iPhone 14 (128 GB) - Midnight",
    "Apple iPhone 14 Plus (128 GB) - Purple",
    "Apple iPhone 13 (128 GB) - Starlight",
    "Apple iPhone 13 mini (128 GB) - Pink",
    "Apple iPhone SE (3rd Generation, 64 GB) - Red",
    "Apple iPhone 12 (64 GB) - White",
];

const SAMSUNG_CATALOG: [&str; 10] = [
    "Samsung Galaxy S24 5G (Onyx Black, 8GB, 256GB)",
    "Samsung Galaxy S23 FE 5G (Mint, 8GB, 128GB)",
    "Samsung Galaxy A55 5G (Awesome Iceblue, 8GB, 128GB)",
    "Samsung Galaxy A35 5G (Awesome Navy, 8GB, 128GB)",
    "Samsung Galaxy M34 5G (Midnight Blue, 6GB, 128GB)",
    "Samsung Galaxy M15 5G (Stone Grey, 6GB, 128GB)",
    "Samsung Galaxy F54 5G (Meteor Blue, 8GB, 256GB)",
    "Samsung Galaxy A15 5G (Blue Black, 8GB, 128GB)",
    "Samsung Galaxy Z Flip5 (Mint, 8GB, 256GB)",
    "Samsung Galaxy M55 5G (Light Green, 8GB, 256GB)",
];

const LAPTOP_CATALOG: [&str; 10] = [
    "HP Pavilion 15 Intel Core i5 12th Gen (16GB/512GB SSD) Laptop",
    "Dell Inspiron 3520 Intel Core i5 (8GB/512GB SSD) Laptop",
    "Lenovo IdeaPad Slim 3 AMD Ryzen 5 7520U (16GB/512GB) Laptop",
    "ASUS Vivobook 15 Intel Core i3 12th Gen (8GB/512GB SSD) Laptop",
    "Acer Aspire Lite AMD Ryzen 5 5500U (16GB/512GB) Laptop",
    "Apple MacBook Air M2 (8GB/256GB SSD) - Midnight",
    "MSI Modern 14 Intel Core i5 (8GB/512GB SSD) Laptop",
    "Lenovo ThinkPad E14 Intel Core i5 13th Gen (16GB/512GB) Laptop",
    "HP Victus Gaming AMD Ryzen 5 RTX 3050 (16GB/512GB) Laptop",
    "ASUS TUF Gaming F15 Intel Core i5 RTX 2050 (16GB/512GB) Laptop",
];

const HEADPHONES_CATALOG: [&str; 10] = [
    "Sony WH-1000XM5 Wireless Noise Cancelling Headphones",
    "boAt Rockerz 450 Bluetooth On Ear Headphones",
    "JBL Tune 760NC Wireless Over Ear Headphones",
    "Sennheiser HD 450BT Bluetooth Headphones",
    "Bose QuietComfort 45 Wireless Headphones",
    "Apple AirPods Pro (2nd Generation) with MagSafe Case",
    "OnePlus Nord Buds 2r True Wireless Earbuds",
    "Noise Buds VS104 Truly Wireless Earbuds",
    "Skullcandy Hesh ANC Wireless Over Ear Headphones",
    "Sony WH-CH720N Wireless Noise Cancelling Headphones",
];

const SMARTPHONE_CATALOG: [&str; 10] = [
    "OnePlus Nord CE4 5G (Celadon Marble, 8GB, 128GB)",
    "Redmi Note 13 Pro 5G (Midnight Black, 8GB, 256GB)",
    "realme Narzo 70 Pro 5G (Glass Green, 8GB, 128GB)",
    "iQOO Z9 5G (Brushed Green, 8GB, 128GB)",
    "Motorola Edge 50 Fusion 5G (Forest Blue, 8GB, 128GB)",
    "POCO X6 5G (Mirror Black, 8GB, 256GB)",
    "Vivo T3 5G (Cosmic Blue, 8GB, 128GB)",
    "OPPO F25 Pro 5G (Lava Red, 8GB, 128GB)",
    "Nothing Phone (2a) 5G (Black, 8GB, 128GB)",
    "Google Pixel 7a (Charcoal, 8GB, 128GB)",
];

/// Catalog bucket a query falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Iphone,
    Samsung,
    Laptop,
    Headphones,
    Smartphone,
}

impl ProductType {
    /// Substring classification, checked in priority order.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("iphone") {
            ProductType::Iphone
        } else if lower.contains("samsung") {
            ProductType::Samsung
        } else if lower.contains("laptop") {
            ProductType::Laptop
        } else if lower.contains("headphone")
            || lower.contains("earphone")
            || lower.contains("earbuds")
        {
            ProductType::Headphones
        } else {
            ProductType::Smartphone
        }
    }

    pub fn target_brand(&self) -> Option<&'static str> {
        match self {
            ProductType::Iphone => Some("Apple"),
            ProductType::Samsung => Some("Samsung"),
            _ => None,
        }
    }

    pub fn base_price(&self) -> u64 {
        match self {
            ProductType::Iphone => 65000,
            ProductType::Samsung => 25000,
            ProductType::Laptop => 60000,
            ProductType::Headphones => 8000,
            ProductType::Smartphone => 20000,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ProductType::Iphone | ProductType::Samsung | ProductType::Smartphone => "smartphone",
            ProductType::Laptop => "laptop",
            ProductType::Headphones => "headphones",
        }
    }

    pub fn catalog(&self) -> &'static [&'static str] {
        match self {
            ProductType::Iphone => &IPHONE_CATALOG,
            ProductType::Samsung => &SAMSUNG_CATALOG,
            ProductType::Laptop => &LAPTOP_CATALOG,
            ProductType::Headphones => &HEADPHONES_CATALOG,
            ProductType::Smartphone => &SMARTPHONE_CATALOG,
        }
    }
}

/// Inclusive price window a synthesized batch is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceWindow {
    pub min: u64,
    pub max: u64,
}

impl PriceWindow {
    pub fn for_query(product_type: ProductType, params: &ScrapingParams) -> Self {
        let base = product_type.base_price();
        Self {
            min: params.min_price.unwrap_or(base * 3 / 10),
            max: params.max_price.unwrap_or(base * 2),
        }
    }

    /// Never panics on an inverted window; `max` wins.
    pub fn clamp(&self, price: u64) -> u64 {
        price.max(self.min).min(self.max)
    }
}

/// Plausible stand-in listings for when no live data could be scraped.
pub struct MockProductSynthesizer {
    amazon_base_url: String,
    flipkart_base_url: String,
}

impl MockProductSynthesizer {
    pub fn new(config: &ScrapingConfig) -> Self {
        Self {
            amazon_base_url: config.amazon_base_url.clone(),
            flipkart_base_url: config.flipkart_base_url.clone(),
        }
    }

    pub fn synthesize(&self, keywords: &str, params: &ScrapingParams) -> Vec<Product> {
        let query = match params.brand.as_deref() {
            Some(brand) => format!("{} {}", keywords, brand),
            None => keywords.to_string(),
        };
        let product_type = ProductType::classify(&query);
        let window = PriceWindow::for_query(product_type, params);
        let base_price = product_type.base_price() as f64;

        info!(
            "Synthesizing {:?} products (brand: {}, window ₹{}-₹{})",
            product_type,
            product_type.target_brand().unwrap_or("any"),
            window.min,
            window.max
        );

        let base_url = match params.site {
            Site::Amazon => self.amazon_base_url.trim_end_matches('/'),
            Site::Flipkart => self.flipkart_base_url.trim_end_matches('/'),
        };
        let batch = Utc::now().timestamp_millis();
        let image = stock_image(Some(product_type.category()));
        let mut rng = rand::thread_rng();

        product_type
            .catalog()
            .iter()
            .take(MAX_MOCK_PRODUCTS)
            .enumerate()
            .map(|(i, title)| {
                let variation = rng.gen_range(-PRICE_VARIATION..=PRICE_VARIATION);
                let price = window.clamp((base_price * (1.0 + variation)).round() as u64);

                let rating: f64 = rng.gen_range(3.8..=5.0);
                let reviews: u64 = rng.gen_range(500..8500);

                let suffix = Uuid::new_v4().simple().to_string();
                let id = format!("mock_{}_{}_{}", batch, i, &suffix[..8]);

                Product {
                    link: format!("{}/dp/{}", base_url, id),
                    id,
                    title: title.to_string(),
                    price: format_price(price),
                    image: image.to_string(),
                    is_amazon_choice: i < 2,
                    relevance_score: (1.0 - i as f64 * 0.05).max(0.7),
                    match_reasons: vec![
                        REASON_AI.to_string(),
                        REASON_CATEGORY.to_string(),
                        REASON_PRICE_OPTIMIZED.to_string(),
                    ],
                    rating: Some(format!("{:.1}", rating)),
                    review_count: Some(group_digits(reviews)),
                }
            })
            .collect()
    }
}
