//! Static product catalog.
//!
//! The shop sells a small fixed range; Square-sourced merch is listed
//! separately through `/api/square-products`.

use bejaus_core::{Product, ProductCategory, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;

const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Ordering offered by the shop grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Featured products first, catalog order otherwise.
    #[default]
    Featured,
    Name,
    /// Cheapest first.
    Price,
}

/// Shop grid query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default)]
    pub sort: SortBy,
}

/// The products on sale.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(products())
    }
}

impl Catalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Look a product up by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products matching the query, in the requested order.
    #[must_use]
    pub fn list(&self, query: &CatalogQuery) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| query.category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();

        match query.sort {
            SortBy::Featured => products.sort_by_key(|p| !p.featured),
            SortBy::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
            SortBy::Price => products.sort_by_key(|p| p.price),
        }
        products
    }
}

/// The Bejaus Sessions product range.
#[must_use]
pub fn products() -> Vec<Product> {
    vec![
        apparel(
            product(
                "bejaus-tshirt",
                "Camiseta Bejaus Sessions",
                "Camiseta de algodón orgánico 100% con el logo exclusivo de Bejaus Sessions. Perfecta para los amantes de la música y el café.",
                25,
                ProductCategory::Clothing,
                50,
                true,
            ),
            &["S", "M", "L", "XL"],
        ),
        apparel(
            product(
                "bejaus-hoodie",
                "Hoodie Bejaus Sessions",
                "Sudadera con capucha de alta calidad. Suave por dentro, resistente por fuera. Ideal para las noches de sesiones.",
                45,
                ProductCategory::Clothing,
                30,
                true,
            ),
            &["S", "M", "L", "XL", "XXL"],
        ),
        product(
            "bejaus-cap",
            "Gorra Bejaus Sessions",
            "Gorra ajustable con bordado de alta calidad. El complemento perfecto para cualquier outfit casual.",
            20,
            ProductCategory::Accessories,
            25,
            false,
        ),
        product(
            "bejaus-tote",
            "Tote Bag Bejaus",
            "Bolsa de tela resistente y ecológica. Perfecta para llevar tus discos, café o cualquier cosa que necesites.",
            15,
            ProductCategory::Accessories,
            40,
            false,
        ),
        product(
            "bejaus-vinyl",
            "Compilation Vinyl Vol.1",
            "Recopilación en vinilo de los mejores momentos de nuestras sesiones. Edición limitada numerada.",
            35,
            ProductCategory::Vinyl,
            100,
            true,
        ),
        product(
            "bejaus-coffee",
            "Café Bejaus Blend",
            "Mezcla exclusiva de café tostado artesanalmente. El mismo café que servimos en nuestras sesiones.",
            12,
            ProductCategory::Coffee,
            80,
            false,
        ),
    ]
}

fn product(
    id: &str,
    name: &str,
    description: &str,
    euros: i64,
    category: ProductCategory,
    stock: u32,
    featured: bool,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        price: Decimal::from(euros),
        images: vec![PLACEHOLDER_IMAGE.to_string()],
        category,
        sizes: None,
        colors: None,
        in_stock: true,
        stock_count: Some(stock),
        featured,
    }
}

/// Clothing comes in sizes and the two house colors.
fn apparel(mut product: Product, sizes: &[&str]) -> Product {
    product.sizes = Some(sizes.iter().map(|s| (*s).to_string()).collect());
    product.colors = Some(vec!["Forest Green".to_string(), "Beige".to_string()]);
    product
}
