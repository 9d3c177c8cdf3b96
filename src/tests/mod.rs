mod common;
mod column_initialization;
mod upstream_end_to_end;
