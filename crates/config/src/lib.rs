// Column preference persistence

pub mod preferences;
pub mod store;

pub use preferences::{
    reorder, ColumnPreferences, PinSide, PreferenceDefaults, PreferencesManager, WidthClamp,
};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, StoreError};

#[cfg(feature = "test-support")]
pub use store::FailingStore;
