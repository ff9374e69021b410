//! Site command handlers.

use tabled::Tabled;

use mistly_core::{
    ApiInventory, AssignConfig, IdentifierKind, IdentifierResolver, Inventory, ResolvedSite, Site,
};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Timezone")]
    timezone: String,
}

impl From<&Site> for SiteRow {
    fn from(s: &Site) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            country: util::or_dash(s.country_code.as_deref()),
            timezone: util::or_dash(s.timezone.as_deref()),
        }
    }
}

fn kind_label(kind: IdentifierKind) -> &'static str {
    match kind {
        IdentifierKind::CanonicalId => "canonical ID",
        IdentifierKind::SiteCode => "site code",
        IdentifierKind::Name => "site name",
    }
}

fn resolved_detail(input: &str, r: &ResolvedSite) -> String {
    [
        format!("Input:    {input}"),
        format!("Kind:     {}", kind_label(r.kind)),
        format!("Lookup:   {}", r.lookup),
        format!("Site ID:  {}", r.site.id),
        format!("Name:     {}", r.site.name),
        format!("Address:  {}", r.site.address.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    inventory: &ApiInventory,
    config: &AssignConfig,
    args: SitesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List => {
            let mut sites = inventory.list_sites(&config.org_id).await?;
            sites.sort_by(|a, b| a.name.cmp(&b.name));
            let out = output::render_list(
                global.output,
                &sites,
                |s| SiteRow::from(s),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Resolve { identifier } => {
            let resolved = IdentifierResolver::new(inventory, config)
                .resolve_site(&identifier)
                .await?;
            let out = output::render_single(
                global.output,
                &resolved,
                |r| resolved_detail(&identifier, r),
                |r| r.site.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
