pub(crate) mod poller;
pub(crate) mod source;
