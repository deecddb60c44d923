use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateScanRequest {
    pub user_id: Option<String>,
    pub repo_url: Option<String>,
    pub target_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateFindingStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
