use clap::Parser;
use routeshed::app::RouteshedApp;
use routeshed_core::model::PartitionError;

fn main() -> Result<(), PartitionError> {
    env_logger::init();
    log::debug!("cwd: {:?}", std::env::current_dir());
    let args = RouteshedApp::parse();
    args.op.run()
}
