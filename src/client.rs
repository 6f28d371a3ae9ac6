use aws_config::{
    meta::region::RegionProviderChain,
    BehaviorVersion,
    Region,
    SdkConfig};
use aws_sdk_s3::Client;


/// region used when neither the environment nor the profile names one.
/// Bucket listing is global, so any region works for the initial client.
pub const FALLBACK_REGION: &str = "us-east-1";


/// load the shared AWS configuration from the environment (credentials, profile, region)
pub async fn load_config() -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else(Region::new(FALLBACK_REGION));

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// get a client that sends its requests to `region`, reusing credentials and settings of `config`
pub fn regional_client(config: &SdkConfig, region: &str) -> Client {
    let s3_config = aws_sdk_s3::config::Builder::from(config)
        .region(Region::new(region.to_owned()))
        .build();
    Client::from_conf(s3_config)
}
