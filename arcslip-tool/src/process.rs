use anyhow::Result;
use arcslip_lib::{BuildPlan, BuildRequest, build_archive_sync, validate_inputs};
use tracing::info;

/// Validates the request, then either prints the plan (`dry`) or writes the
/// archive and prints a confirmation line.
pub fn run(request: &BuildRequest, dry: bool) -> Result<()> {
    validate_inputs(&request.files, &request.target)?;
    let plan = BuildPlan::from_request(request)?;

    if dry {
        print_plan(&plan)?;
        return Ok(());
    }

    let summary = build_archive_sync(plan)?;
    info!(
        format = %summary.format,
        entries = summary.names.len(),
        "archive written"
    );

    println!(
        "Created {} with traversal path applied to {}",
        summary.output.display(),
        request.target.display()
    );
    Ok(())
}

fn print_plan(plan: &BuildPlan) -> Result<()> {
    println!("--- DRY RUN ---");
    println!("{}", serde_yaml::to_string(plan)?);
    println!(
        "Dry run - would create {} archive with {} files",
        plan.format,
        plan.entries.len()
    );
    for entry in &plan.entries {
        println!("  {} -> {}", entry.path.display(), entry.display_name());
    }
    println!("Output: {}", plan.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use arcslip_lib::{BuildError, ErrorKind};

    use super::*;

    fn request(dir: &Path, output: &str) -> BuildRequest {
        let a = dir.join("a.txt");
        let b = dir.join("b.txt");
        fs::write(&a, "alpha").unwrap();
        fs::write(&b, "beta").unwrap();
        BuildRequest {
            files: vec![a.clone(), b],
            target: a,
            traversal: "../../tmp/evil".to_string(),
            output: dir.join(output),
            compress: false,
        }
    }

    fn kind(err: &anyhow::Error) -> ErrorKind {
        err.downcast_ref::<BuildError>().unwrap().kind()
    }

    #[test]
    fn writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "x.tar");
        run(&req, false).unwrap();
        assert!(req.output.is_file());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "x.zip");
        run(&req, true).unwrap();
        assert!(!req.output.exists());
    }

    #[test]
    fn missing_input_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), "x.zip");
        req.files.push(dir.path().join("missing.txt"));

        let err = run(&req, false).unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Validation);
        assert!(!req.output.exists());
    }

    #[test]
    fn target_outside_list_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), "x.zip");
        req.files.remove(0);

        let err = run(&req, false).unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Validation);
        assert!(!req.output.exists());
    }

    #[test]
    fn unknown_extension_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "x.rar");

        let err = run(&req, false).unwrap_err();
        assert_eq!(kind(&err), ErrorKind::UnsupportedFormat);
        assert!(!req.output.exists());
    }
}
