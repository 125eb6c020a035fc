use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("prlive {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: prlive");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("PRLIVE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("features: native-tls={}", cfg!(feature = "native-tls"));
    println!(
        "defaults: reconnect_attempts={}, reconnect_interval_ms={}",
        prlive_channel::DEFAULT_RECONNECT_ATTEMPTS,
        prlive_channel::DEFAULT_RECONNECT_INTERVAL.as_millis()
    );

    Ok(SUCCESS)
}
