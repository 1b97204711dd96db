mod block_cache;
mod file_reader;
mod range_reader;
mod s3_reader;

pub use block_cache::{BlockCache, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
pub use file_reader::FileRangeReader;
pub use range_reader::{read_f64_le, read_i32_le, read_u32_le, read_u64_le, RangeReader};
pub use s3_reader::{create_s3_client, S3RangeReader};
