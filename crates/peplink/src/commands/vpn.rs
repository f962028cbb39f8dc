//! `peplink vpn`: PepVPN / SpeedFusion profile states.

use tabled::Tabled;

use peplink_core::{Cadence, RouterConfig, VpnProfile, VpnState};

use crate::error::CliError;
use crate::output::{self, Printer};

#[derive(Tabled)]
struct VpnRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
}

impl VpnRow {
    fn new(p: &VpnProfile, printer: &Printer) -> Self {
        let label = p.state.label();
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            kind: p.kind.clone().unwrap_or_else(output::dash),
            state: match p.state {
                VpnState::Connected => printer.good(label),
                VpnState::Connecting => printer.warn(label),
                VpnState::Disconnected => printer.bad(label),
                VpnState::Other(_) => printer.dim(label),
            },
        }
    }
}

pub async fn handle(router: RouterConfig, printer: &Printer) -> Result<(), CliError> {
    let snapshot = super::poll(router, &[Cadence::Vpn]).await?;
    let profiles = snapshot.vpn_profiles().unwrap_or_default();
    let out = printer.list(profiles, || {
        profiles.iter().map(|p| VpnRow::new(p, printer)).collect()
    })?;
    printer.print(&out);
    Ok(())
}
