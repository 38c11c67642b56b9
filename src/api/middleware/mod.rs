pub mod deadline;
pub mod recovery;
pub mod request_id;
