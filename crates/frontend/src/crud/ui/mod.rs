mod crud_modal;
mod data_table;

pub use crud_modal::CrudModal;
pub use data_table::DataTable;
