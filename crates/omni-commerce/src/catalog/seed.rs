//! Starter catalog.
//!
//! Grocery products the storefront opens with. Written to an empty store by
//! [`CatalogStore::seed_if_empty`](crate::catalog::CatalogStore::seed_if_empty).

use crate::catalog::Product;

/// Category tags with their cover images.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("chips", "https://images.unsplash.com/photo-1566478989037-eec170784d0b?w=400&h=300&fit=crop"),
    ("chocolates", "https://images.unsplash.com/photo-1575377427642-087cf684f29d?w=400&h=300&fit=crop"),
    ("rice", "https://images.unsplash.com/photo-1586201375761-83865001e31c?w=400&h=300&fit=crop"),
    ("dhal", "https://images.unsplash.com/photo-1585032226651-759b368d7246?w=400&h=300&fit=crop"),
    ("sugar", "https://images.unsplash.com/photo-1558642452-9d2a7deb7f62?w=400&h=300&fit=crop"),
    ("bread", "https://images.unsplash.com/photo-1509440159596-0249088772ff?w=400&h=300&fit=crop"),
    ("dairy", "https://images.unsplash.com/photo-1563636619-e9143da7973b?w=400&h=300&fit=crop"),
    ("spices", "https://images.unsplash.com/photo-1596040033229-a9821ebd058d?w=400&h=300&fit=crop"),
];

/// The starter products, p1 through p24.
pub fn seed_products() -> Vec<Product> {
    [
        ("p1", "Lays Classic Salted", 20, "chips", "Crispy salted potato chips", 85, 100, "https://images.unsplash.com/photo-1566478989037-eec170784d0b?w=300&h=300&fit=crop"),
        ("p2", "Kurkure Masala Munch", 20, "chips", "Spicy masala puffed snack", 60, 100, "https://images.unsplash.com/photo-1613919113640-25732ec5e61f?w=300&h=300&fit=crop"),
        ("p3", "Uncle Chips Plain", 15, "chips", "Classic plain potato chips", 12, 100, "https://images.unsplash.com/photo-1621447504864-d8686e12698c?w=300&h=300&fit=crop"),
        ("p4", "Cadbury Dairy Milk", 50, "chocolates", "Smooth milk chocolate bar", 70, 100, "https://images.unsplash.com/photo-1575377427642-087cf684f29d?w=300&h=300&fit=crop"),
        ("p5", "5 Star Chocolate", 20, "chocolates", "Caramel nougat chocolate", 45, 100, "https://images.unsplash.com/photo-1623660053975-cf75a8be0908?w=300&h=300&fit=crop"),
        ("p6", "KitKat Wafer Bar", 40, "chocolates", "Crispy wafer in chocolate", 8, 100, "https://images.unsplash.com/photo-1582176604856-e824b4736522?w=300&h=300&fit=crop"),
        ("p7", "India Gate Basmati", 180, "rice", "Premium long grain basmati rice 1kg", 50, 100, "https://images.unsplash.com/photo-1586201375761-83865001e31c?w=300&h=300&fit=crop"),
        ("p8", "Sona Masoori Rice", 120, "rice", "Lightweight everyday rice 1kg", 30, 100, "https://images.unsplash.com/photo-1536304993881-460e71366090?w=300&h=300&fit=crop"),
        ("p9", "Ponni Boiled Rice", 100, "rice", "Traditional boiled rice 1kg", 22, 100, "https://images.unsplash.com/photo-1594313753328-8090d43e2e10?w=300&h=300&fit=crop"),
        ("p10", "Toor Dal Premium", 140, "dhal", "Yellow split pigeon peas 1kg", 40, 100, "https://images.unsplash.com/photo-1585032226651-759b368d7246?w=300&h=300&fit=crop"),
        ("p11", "Moong Dal Washed", 160, "dhal", "Split green gram 1kg", 55, 100, "https://images.unsplash.com/photo-1612257416648-ee7a6c533b4f?w=300&h=300&fit=crop"),
        ("p12", "Chana Dal", 120, "dhal", "Bengal gram split 1kg", 18, 100, "https://images.unsplash.com/photo-1515543904279-35e48fd9bc25?w=300&h=300&fit=crop"),
        ("p13", "India Gate Sugar", 45, "sugar", "Refined white sugar 1kg", 90, 100, "https://images.unsplash.com/photo-1558642452-9d2a7deb7f62?w=300&h=300&fit=crop"),
        ("p14", "Uttam Sugar", 42, "sugar", "Fine grain sugar 1kg", 75, 100, "https://images.unsplash.com/photo-1550411294-098c0d13adbc?w=300&h=300&fit=crop"),
        ("p15", "Organic Jaggery", 65, "sugar", "Natural jaggery block 500g", 5, 100, "https://images.unsplash.com/photo-1604514628550-37477afdf4e3?w=300&h=300&fit=crop"),
        ("p16", "Britannia White Bread", 40, "bread", "Soft white sandwich bread", 35, 100, "https://images.unsplash.com/photo-1509440159596-0249088772ff?w=300&h=300&fit=crop"),
        ("p17", "Harvest Gold Wheat", 45, "bread", "Whole wheat bread loaf", 20, 100, "https://images.unsplash.com/photo-1549931319-a545753467c8?w=300&h=300&fit=crop"),
        ("p18", "Wibs Multigrain", 55, "bread", "Multigrain health bread", 14, 100, "https://images.unsplash.com/photo-1586444248879-bc604bc77daa?w=300&h=300&fit=crop"),
        ("p19", "Amul Taza Milk 1L", 60, "dairy", "Fresh toned milk 1 litre", 65, 100, "https://images.unsplash.com/photo-1563636619-e9143da7973b?w=300&h=300&fit=crop"),
        ("p20", "Amul Butter 100g", 55, "dairy", "Pasteurized salted butter", 48, 100, "https://images.unsplash.com/photo-1589985270826-4b7bb135bc9d?w=300&h=300&fit=crop"),
        ("p21", "Amul Paneer 200g", 90, "dairy", "Fresh cottage cheese block", 10, 100, "https://images.unsplash.com/photo-1631452180519-c014fe946bc7?w=300&h=300&fit=crop"),
        ("p22", "MDH Garam Masala", 75, "spices", "Aromatic spice blend 100g", 80, 100, "https://images.unsplash.com/photo-1596040033229-a9821ebd058d?w=300&h=300&fit=crop"),
        ("p23", "Everest Turmeric", 45, "spices", "Pure turmeric powder 100g", 62, 100, "https://images.unsplash.com/photo-1615485500704-8e990f9900f7?w=300&h=300&fit=crop"),
        ("p24", "Catch Red Chilli", 55, "spices", "Hot red chilli powder 100g", 3, 100, "https://images.unsplash.com/photo-1583119022894-919a68a3d0e3?w=300&h=300&fit=crop"),
    ]
    .into_iter()
    .map(|(id, name, price, category, description, stock, max_stock, image)| {
        Product::new(id, name, price, category, stock, max_stock)
            .with_description(description)
            .with_image(image)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_products_are_valid() {
        let products = seed_products();
        assert_eq!(products.len(), 24);
        for product in &products {
            product.validate().unwrap();
        }

        let ids: HashSet<_> = products.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), products.len());
    }

    #[test]
    fn test_seed_categories_known() {
        let known: HashSet<&str> = CATEGORIES.iter().map(|(id, _)| *id).collect();
        assert_eq!(known.len(), 8);
        assert!(seed_products()
            .iter()
            .all(|p| known.contains(p.category.as_str())));
    }

    #[test]
    fn test_seed_reference_products() {
        let products = seed_products();
        let p1 = &products[0];
        assert_eq!(p1.id.as_str(), "p1");
        assert_eq!(p1.price.amount(), 20);
        assert_eq!(p1.stock, 85);

        let p3 = products.iter().find(|p| p.id.as_str() == "p3").unwrap();
        assert_eq!(p3.stock, 12);
    }
}
