use std::fs;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn write_config(content: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(dir.path().join("provision.toml"), content).expect("write config");
    dir
}

mod success {
    use super::*;

    #[test]
    fn provisions_with_default_user() {
        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .arg("run")
            .assert()
            .success()
            .stdout(contains("Provisioned user u0001"))
            .stdout(contains("user-u0001-bucket"))
            .stdout(contains("obj-0001"))
            .stdout(contains("✓ publish_notification"))
            .stdout(contains("Rollback").not());
    }

    #[test]
    fn accepts_user_and_latency_flags() {
        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args([
                "run",
                "--name",
                "Ada Lovelace",
                "--email",
                "ada@example.com",
                "--latency-ms",
                "1",
            ])
            .assert()
            .success()
            .stdout(contains("Provisioned user u0001"));
    }
}

mod failure {
    use super::*;

    #[test]
    fn deferred_failure_rolls_back_in_reverse_order() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--fail-at", "notify"])
            .assert()
            .failure()
            .stdout(contains("could not send the welcome notification"))
            .stdout(contains("Rolling back 3 step(s)"))
            .stderr(contains(
                "error: NotificationError: step 'publish_notification' failed",
            ))
            .get_output()
            .stdout
            .clone();

        let stdout = String::from_utf8(output).expect("utf-8 stdout");
        let upload = stdout.find("↩ upload_object").expect("upload released");
        let container = stdout
            .find("↩ create_container")
            .expect("container released");
        let record = stdout.find("↩ create_record").expect("record released");
        assert!(upload < container && container < record);
    }

    #[test]
    fn first_stage_failure_has_nothing_to_release() {
        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--fail-at", "record"])
            .assert()
            .failure()
            .stdout(contains("could not create the user record"))
            .stdout(contains("Rollback: nothing to release"))
            .stderr(contains("RecordCreateError"));
    }

    #[test]
    fn panicking_stage_is_reported_as_defect() {
        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--fail-at", "upload", "--fault", "panic"])
            .assert()
            .failure()
            .stdout(contains("could not provision storage: defect:"))
            .stdout(contains("↩ create_container"))
            .stderr(contains("error: ResourceError: step 'upload_object' failed"));
    }

    #[test]
    fn eager_policy_rolls_back_before_returning() {
        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--fail-at", "container", "--policy", "eager"])
            .assert()
            .failure()
            .stdout(contains("Rolling back").not())
            .stdout(contains("↩ create_record"))
            .stderr(contains("ResourceError"));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--policy", "sometimes"])
            .assert()
            .failure()
            .stderr(contains("unknown compensation policy 'sometimes'"));
    }
}

mod config_file {
    use super::*;

    #[test]
    fn file_settings_drive_the_run() {
        let dir = write_config(
            r#"
[saga]
compensation_policy = "eager"

[simulation]
fail_at = "upload"
"#,
        );

        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--config"])
            .arg(dir.path().join("provision.toml"))
            .assert()
            .failure()
            .stdout(contains("Rolling back").not())
            .stdout(contains("↩ create_container"))
            .stderr(contains("ResourceError"));
    }

    #[test]
    fn flags_override_file_settings() {
        let dir = write_config("[simulation]\nfail_at = \"record\"\n");

        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--fail-at", "notify", "--config"])
            .arg(dir.path().join("provision.toml"))
            .assert()
            .failure()
            .stderr(contains("NotificationError"));
    }

    #[test]
    fn malformed_file_is_reported_with_cause() {
        let dir = write_config("[saga\ncompensation_policy = ");

        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--config"])
            .arg(dir.path().join("provision.toml"))
            .assert()
            .failure()
            .stderr(contains("error: failed to parse config file"))
            .stderr(contains("caused by:"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().expect("create temp dir");

        assert_cmd::cargo::cargo_bin_cmd!("provision")
            .args(["run", "--config"])
            .arg(dir.path().join("absent.toml"))
            .assert()
            .failure()
            .stderr(contains("error: failed to read config file"));
    }
}
