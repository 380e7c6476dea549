pub mod drive_cache;
pub mod erp;
pub mod hr;
pub mod llm;
pub mod util;
pub mod vector;
