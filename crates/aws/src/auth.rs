use tracing::debug;

use crate::config::AwsBaseConfig;

/// Build an AWS SDK configuration from the given [`AwsBaseConfig`].
///
/// Starts from the standard environment credential chain, then applies:
/// - the endpoint URL override for local development (e.g. `LocalStack`)
/// - static credentials, when [`AwsBaseConfig::sdk_credentials`] resolves any
///
/// # Examples
///
/// ```no_run
/// use mailwire_aws::config::AwsBaseConfig;
/// use mailwire_aws::auth::build_sdk_config;
///
/// # async fn example() {
/// let config = AwsBaseConfig::new("us-east-1")
///     .with_endpoint_url("http://localhost:4566");
/// let sdk_config = build_sdk_config(&config).await;
/// # }
/// ```
pub async fn build_sdk_config(config: &AwsBaseConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    if let Some(creds) = config.sdk_credentials() {
        debug!(access_key_id = %creds.access_key_id, "using static AWS credentials");
        loader = loader.credentials_provider(aws_sdk_sesv2::config::Credentials::new(
            creds.access_key_id,
            creds.secret_access_key,
            creds.session_token,
            None,
            "mailwire",
        ));
    }

    loader.load().await
}
