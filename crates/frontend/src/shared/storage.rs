use contracts::crud::ConnectionDetails;
use web_sys::window;

const CONNECTION_KEY: &str = "crud_grid_connection";

fn get_local_storage() -> Option<web_sys::Storage> {
    window()?.local_storage().ok()?
}

/// Remember the connection for the next visit
pub fn save_connection(connection: &ConnectionDetails) {
    if let (Some(storage), Ok(json)) = (get_local_storage(), serde_json::to_string(connection)) {
        let _ = storage.set_item(CONNECTION_KEY, &json);
    }
}

/// Last used connection, if any
pub fn load_connection() -> Option<ConnectionDetails> {
    let json = get_local_storage()?.get_item(CONNECTION_KEY).ok()??;
    serde_json::from_str(&json).ok()
}
