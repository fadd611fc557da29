mod asset_index;

pub use asset_index::{sync_assets, AssetIndex, AssetObject, AssetReport};
