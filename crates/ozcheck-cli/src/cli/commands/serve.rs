//! Web server command.

use console::style;

use ozcheck::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = match bind {
        Some(bind) => parse_bind_address(bind, settings),
        None => (settings.host.clone(), settings.port),
    };

    println!(
        "{} Loading OZ data from {}",
        style("→").cyan(),
        settings.data_source
    );
    println!(
        "{} Starting ozcheck server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    ozcheck_server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> <configured host>:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:<configured port>
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str, settings: &Settings) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return (settings.host.clone(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), settings.port)
}
