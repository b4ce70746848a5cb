use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, ValueEnum};
use serde_json::{json, Value};

use lnd_confwatch::security::{build_access_token, Caveat, Macaroon};

#[derive(Parser)]
#[command(name = "macaroon-inspect")]
#[command(about = "Decode an LND macaroon and print its contents", long_about = None)]
struct Cli {
    /// Encoded macaroon.
    token: String,

    /// Input encoding.
    #[arg(short, long, value_enum, default_value_t = Encoding::Base64)]
    encoding: Encoding,

    /// Include the size of the re-encoded V2 token.
    #[arg(long)]
    show_wire: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    Base64,
    Hex,
}

fn caveat_json(caveat: &Caveat) -> Value {
    json!({
        "id": String::from_utf8_lossy(&caveat.id),
        "third_party": caveat.is_third_party(),
        "location": caveat.location,
    })
}

fn describe(macaroon: &Macaroon, show_wire: bool) -> Value {
    let mut out = json!({
        "location": macaroon.location(),
        "identifier": hex::encode(macaroon.identifier()),
        "caveats": macaroon.caveats().iter().map(caveat_json).collect::<Vec<_>>(),
    });
    if show_wire {
        out["wire_len"] = json!(macaroon.to_binary().len());
    }
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let raw = match cli.encoding {
        Encoding::Base64 => STANDARD.decode(cli.token.trim())?,
        Encoding::Hex => hex::decode(cli.token.trim())?,
    };
    let macaroon = build_access_token(&raw)?;

    println!("{}", serde_json::to_string_pretty(&describe(&macaroon, cli.show_wire))?);
    Ok(())
}
