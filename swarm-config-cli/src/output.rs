use colored::*;
use serde::Serialize;
use swarm_config::MigrationReport;
use swarm_config::model::ServiceId;

#[derive(Serialize)]
struct JsonReport<'a> {
    status: &'static str,
    dry_run: bool,
    #[serde(flatten)]
    report: &'a MigrationReport,
}

pub fn print_report(report: &MigrationReport, dry_run: bool, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", render_json(report, dry_run)?);
    } else {
        print!("{}", render_text(report, dry_run));
    }
    Ok(())
}

pub fn print_error(error: &anyhow::Error, json: bool) {
    if json {
        let error_json = serde_json::json!({
            "status": "error",
            "message": format!("{error:#}"),
        });
        println!("{error_json}");
    } else {
        eprintln!("{} {:#}", "Error:".red().bold(), error);
    }
}

fn render_json(report: &MigrationReport, dry_run: bool) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        status: "ok",
        dry_run,
        report,
    })
}

fn services(ids: &[ServiceId]) -> String {
    if ids.is_empty() {
        return "none".dimmed().to_string();
    }
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
        .cyan()
        .to_string()
}

fn render_text(report: &MigrationReport, dry_run: bool) -> String {
    let mut out = String::new();

    if dry_run {
        out.push_str(&format!(
            "{}\n",
            "Dry run: the cluster was not changed".yellow().bold()
        ));
    }

    out.push_str(&format!(
        "{} {} -> {}: {}\n",
        "Updated".green(),
        report.source.name.bold(),
        report.target.name.bold(),
        services(&report.swapped_forward)
    ));
    out.push_str(&format!(
        "{} {} ({})\n",
        "Removed".green(),
        report.source.name.bold(),
        report.removed
    ));
    out.push_str(&format!(
        "{} {} ({}) with the content of {}\n",
        "Re-created".green(),
        report.recreated.name.bold(),
        report.recreated.id,
        report.target.name.bold()
    ));
    out.push_str(&format!(
        "{} {} -> {}: {}\n",
        "Updated".green(),
        report.target.name.bold(),
        report.recreated.name.bold(),
        services(&report.swapped_back)
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_config::ConfigSummary;

    fn report() -> MigrationReport {
        MigrationReport {
            source: ConfigSummary {
                id: "a1".into(),
                name: "blue".to_string(),
            },
            target: ConfigSummary {
                id: "b1".into(),
                name: "green".to_string(),
            },
            swapped_forward: vec!["s1".into(), "s2".into()],
            removed: "a1".into(),
            recreated: ConfigSummary {
                id: "a2".into(),
                name: "blue".to_string(),
            },
            swapped_back: vec![],
        }
    }

    #[test]
    fn test_render_text() {
        colored::control::set_override(false);

        let text = render_text(&report(), true);

        assert_eq!(
            text,
            "Dry run: the cluster was not changed\n\
             Updated blue -> green: s1, s2\n\
             Removed blue (a1)\n\
             Re-created blue (a2) with the content of green\n\
             Updated green -> blue: none\n"
        );
    }

    #[test]
    fn test_render_json() {
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&report(), false).unwrap()).unwrap();

        assert_eq!(value["status"], "ok");
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["removed"], "a1");
        assert_eq!(value["recreated"]["id"], "a2");
        assert_eq!(value["swapped_forward"], serde_json::json!(["s1", "s2"]));
    }
}
