pub mod batch;
pub mod gateway;
pub mod gcs;
pub mod s3;
pub mod storage;
