pub(crate) mod file_io;
