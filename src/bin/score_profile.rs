use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use acl_risk_terminal::athlete::{AthleteProfile, NumericField};
use acl_risk_terminal::config::AppConfig;
use acl_risk_terminal::inference::CONNECT_LABEL;
use acl_risk_terminal::{artifacts, logging};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    let _guard = logging::init(&cfg.log, false, "warn")?;

    let path = std::env::args().nth(1).map(PathBuf::from);
    let raw = match &path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read profile {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read profile from stdin")?;
            buf
        }
    };
    let profile: AthleteProfile = serde_json::from_str(&raw).context("parse athlete profile")?;

    for field in NumericField::ALL {
        let value = profile.numeric(field);
        if !field.range().contains(&value) {
            tracing::warn!(field = field.column(), value, "value outside form range");
        }
    }

    let pipeline = artifacts::load_pipeline(&cfg.artifacts).context("load risk model")?;
    let assessment = pipeline.evaluate(&profile)?;
    let advice = assessment.advice();

    println!("Predicted ACL Risk Score: {}", assessment.score);
    println!("{}", advice.message());
    println!("{CONNECT_LABEL}: {}", advice.link());

    Ok(())
}
