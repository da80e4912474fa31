use std::sync::Arc;

use async_trait::async_trait;
use instance_authn_sdk::{PlatformClient, PlatformClientConnector, PlatformError, PlatformSettings};
use tracing::info;

use super::client::CloudControllerClient;

/// Connects to the Cloud Controller named by the backend configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloudControllerConnector;

#[async_trait]
impl PlatformClientConnector for CloudControllerConnector {
    #[tracing::instrument(skip_all, fields(api = %settings.api_addr))]
    async fn connect(
        &self,
        settings: &PlatformSettings,
    ) -> Result<Arc<dyn PlatformClient>, PlatformError> {
        let client = CloudControllerClient::connect(settings).await?;
        info!("connected to cloud controller");
        Ok(Arc::new(client))
    }
}
