// Pure simulation steps used by the replicated model.

pub mod platforms;
