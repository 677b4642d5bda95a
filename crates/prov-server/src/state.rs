use prov_store::ProvenanceClient;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub client: ProvenanceClient,
}

impl AppState {
    pub fn new(client: ProvenanceClient) -> Self {
        Self { client }
    }
}
