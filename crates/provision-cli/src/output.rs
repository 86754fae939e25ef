use std::fmt::Write;

use provision_operations::ProvisionFault;
use provision_operations::operations::provision::ProvisionReceipt;
use provision_saga::{RollbackReport, SagaAuditLog};

pub fn format_receipt(receipt: &ProvisionReceipt) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Provisioned user {}", receipt.user_id);
    let _ = writeln!(out, "  container:    {}", receipt.container);
    let _ = writeln!(out, "  object:       {}", receipt.object_id);
    let _ = writeln!(out, "  notification: {}", receipt.message);
    out
}

pub fn format_report(report: &RollbackReport<ProvisionFault>) -> String {
    let mut out = String::new();
    if report.is_empty() {
        let _ = writeln!(out, "Rollback: nothing to release");
        return out;
    }

    let _ = writeln!(out, "Rollback:");
    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(()) => {
                let _ = writeln!(out, "  ↩ {}: {}", outcome.step, outcome.description);
            }
            Err(error) => {
                let _ = writeln!(
                    out,
                    "  ⚠ {}: {} ({})",
                    outcome.step,
                    outcome.description,
                    error
                );
            }
        }
    }
    out
}

pub fn format_audit(audit: &SagaAuditLog) -> String {
    let mut out = String::from("Steps:\n");
    for line in audit.summary().lines() {
        let _ = writeln!(out, "  {line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_lists_every_resource() {
        let receipt = ProvisionReceipt {
            user_id: "u0001".to_string(),
            container: "user-u0001-bucket".to_string(),
            object_id: "obj-0001".to_string(),
            message: "notification published".to_string(),
        };

        let rendered = format_receipt(&receipt);

        assert!(rendered.starts_with("Provisioned user u0001\n"));
        assert!(rendered.contains("user-u0001-bucket"));
        assert!(rendered.contains("obj-0001"));
    }

    #[test]
    fn audit_of_an_unstarted_run_has_no_steps() {
        let log = SagaAuditLog::new();

        assert_eq!(format_audit(&log), "Steps:\n");
    }
}
