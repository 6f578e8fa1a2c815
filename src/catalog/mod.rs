//! Product catalog: products, sizes, colors, design types, images, and the
//! per-(product, size, color) inventory grid.

pub mod model;
pub mod storage;

pub use model::{
    ColorRow, DesignTypeRow, InventoryCellRow, LowStockRow, NewProduct, ProductBundle,
    ProductFilter, ProductImageRow, ProductRow, ProductUpdate, SizeRow,
};
pub use storage::CatalogStorage;
