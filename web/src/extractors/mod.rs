pub(crate) mod connection_metadata;
