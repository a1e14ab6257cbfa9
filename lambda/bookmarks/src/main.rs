use lambda_http::{run, service_fn, tracing, Error};
mod bookmark;
mod config;
mod error;
mod http_handler;
mod identity;
mod response;
mod router;
mod store;
use config::Config;
use http_handler::function_handler;
use router::RouteTable;
use store::DynamoStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::from_env()?;
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoStore::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config.table_name.as_str(),
    );
    let routes = RouteTable::new(&config.route_prefix);

    tracing::info!(
        table = %config.table_name,
        route_prefix = %config.route_prefix,
        "bookmarks handler ready"
    );

    run(service_fn(|event| function_handler(&store, &routes, event))).await
}
