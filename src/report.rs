use crate::api::mask_password;
use crate::config::ProbeConfig;
use crate::model::{AccountStatus, ContentCount, ContentKind, CountMethod, ProbeResult};
use std::fmt::{self, Write};

/// API URL as shown to the operator, password hidden.
pub fn masked_api_url(result: &ProbeResult) -> String {
    let c = &result.credential;
    mask_password(&format!(
        "{}/player_api.php?username={}&password={}",
        c.base_url, c.username, c.password
    ))
}

/// `Some(true/false)` when the operator configured accepted suffixes, `None` otherwise.
pub fn tld_accepted(base_url: &str, accepted: &[String]) -> Option<bool> {
    if accepted.is_empty() {
        return None;
    }
    let host = reqwest::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))?;
    Some(accepted.iter().any(|suffix| {
        let suffix = suffix.trim().trim_start_matches('.').to_ascii_lowercase();
        !suffix.is_empty() && (host == suffix || host.ends_with(&format!(".{}", suffix)))
    }))
}

pub fn count_line(count: &ContentCount) -> String {
    let label = count.kind.display_name();
    match count.method {
        CountMethod::FullList => format!("{}: {}", label, count.count),
        CountMethod::CategoriesOnly => {
            format!("{}: listing blocked, {} categories (folder count)", label, count.count)
        }
        CountMethod::Unavailable => format!("{}: unavailable", label),
    }
}

pub fn render_text(results: &[ProbeResult], config: &ProbeConfig) -> String {
    let mut out = String::new();
    // writing into a String never fails
    let _ = write_results(&mut out, results, config);
    out
}

fn write_results(out: &mut impl Write, results: &[ProbeResult], config: &ProbeConfig) -> fmt::Result {
    for (i, result) in results.iter().enumerate() {
        writeln!(out, "[{}/{}] {}", i + 1, results.len(), masked_api_url(result))?;
        render_one(out, result, config)?;
        writeln!(out)?;
    }
    Ok(())
}

fn render_one(out: &mut impl Write, result: &ProbeResult, config: &ProbeConfig) -> fmt::Result {
    let account = &result.account;
    if account.status == AccountStatus::Failed {
        return match &result.login_failure {
            Some(failure) => {
                writeln!(out, "  ❌ {}", failure)?;
                writeln!(out, "     {}", failure.suggestion())
            }
            None => writeln!(out, "  ❌ Login failed"),
        };
    }

    writeln!(out, "  ✅ Active, expires: {}", account.expiry.display())?;
    writeln!(
        out,
        "  Connections: {}/{}",
        account.active_connections, account.max_connections
    )?;
    if account.real_server_url != result.credential.base_url.trim_end_matches('/') {
        writeln!(out, "  Real server: {}", account.real_server_url)?;
    }
    match tld_accepted(&account.real_server_url, &config.accepted_tlds) {
        Some(true) => writeln!(out, "  Domain accepted by player")?,
        Some(false) => writeln!(out, "  ⚠️ Domain not in the player's accepted list")?,
        None => {}
    }

    for kind in ContentKind::ALL {
        writeln!(out, "  {}", count_line(result.count(kind)))?;
    }

    if !result.matches.is_empty() {
        writeln!(out, "  Matches:")?;
        for m in &result.matches {
            match &m.detail {
                Some(detail) => writeln!(out, "    [{}] {} ({})", m.kind.display_name(), m.name, detail)?,
                None => writeln!(out, "    [{}] {}", m.kind.display_name(), m.name)?,
            }
        }
    }
    Ok(())
}
