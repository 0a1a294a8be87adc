//! 翻訳ストアモジュール
mod cache;
mod document;
mod locale_files;
mod memory;
mod repository;
mod resolver;

pub use cache::CachedRepository;
pub use document::DocumentRepository;
pub use locale_files::LocaleFileRepository;
pub use memory::MemoryRepository;
pub use repository::{
    RepositoryError,
    TranslationRepository,
};
pub use resolver::{
    TranslationStore,
    TranslationStoreBuilder,
};
