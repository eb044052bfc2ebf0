//! Comprehensive tests for domain_claims

use chrono::Utc;
use rust_decimal_macros::dec;

use core_kernel::{Currency, DocumentId, InsurerId, InvoiceId, Money, PatientId, Rate};
use domain_claims::{apply_action, ClaimAction, ClaimError, ClaimStatus, InsuranceClaim};

fn inr(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::INR)
}

fn submit(claim_amount: rust_decimal::Decimal, invoice_total: rust_decimal::Decimal) -> InsuranceClaim {
    InsuranceClaim::submit(
        "CLM-000100",
        InvoiceId::new(),
        PatientId::new(),
        InsurerId::new(),
        "POL-2026-4471",
        inr(claim_amount),
        Rate::from_percentage(dec!(80)),
        inr(invoice_total),
    )
    .unwrap()
}

/// Scenario E: submit, send to TPA with a document, approve 4,000 of 5,000
#[test]
fn test_full_adjudication_walkthrough() {
    let mut claim = submit(dec!(5000), dec!(5900));
    claim
        .attach_document(DocumentId::new(), "Discharge summary")
        .unwrap();

    apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap();
    assert_eq!(claim.status, ClaimStatus::SubmittedToTpa);

    apply_action(
        &mut claim,
        ClaimAction::Approve {
            approved_amount: inr(dec!(4000)),
        },
        Utc::now(),
    )
    .unwrap();

    assert_eq!(claim.status, ClaimStatus::Approved);
    assert_eq!(
        claim.patient_responsibility(inr(dec!(5900))).unwrap().amount(),
        dec!(1900)
    );
}

#[test]
fn test_rejection_stamps_date_and_is_terminal() {
    let mut claim = submit(dec!(5000), dec!(5900));
    claim
        .attach_document(DocumentId::new(), "Discharge summary")
        .unwrap();
    apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap();

    let at = Utc::now();
    apply_action(&mut claim, ClaimAction::Reject, at).unwrap();
    assert_eq!(claim.status, ClaimStatus::Rejected);
    assert_eq!(claim.tpa_rejection_date, Some(at));

    // Terminal: nothing more is possible, including new documents
    let err = apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap_err();
    assert!(matches!(err, ClaimError::InvalidTransition { .. }));
    let err = claim
        .attach_document(DocumentId::new(), "Late paperwork")
        .unwrap_err();
    assert!(matches!(err, ClaimError::ClaimFinal { .. }));
}

#[test]
fn test_claim_amount_bounded_by_invoice_total_at_submission_only() {
    // Checked once at creation: a claim equal to the invoice total is fine
    let claim = submit(dec!(5900), dec!(5900));
    assert_eq!(claim.claim_amount.amount(), dec!(5900));
}

#[test]
fn test_multiple_info_request_rounds() {
    let mut claim = submit(dec!(5000), dec!(5900));
    claim
        .attach_document(DocumentId::new(), "Discharge summary")
        .unwrap();
    apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap();

    for round_document in ["Itemized bill", "Lab reports"] {
        apply_action(&mut claim, ClaimAction::RequestInfo, Utc::now()).unwrap();
        assert_eq!(claim.status, ClaimStatus::InfoRequested);

        claim
            .attach_document(DocumentId::new(), round_document)
            .unwrap();
        apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap();
        assert_eq!(claim.status, ClaimStatus::SubmittedToTpa);
    }

    // Documents from earlier rounds do not satisfy a fresh request
    apply_action(&mut claim, ClaimAction::RequestInfo, Utc::now()).unwrap();
    let err = apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap_err();
    assert!(matches!(err, ClaimError::NoNewDocuments));
}

#[test]
fn test_approval_is_decoupled_from_invoice_settlement() {
    // Approval only records the committed amount; the claim carries no
    // machinery to mutate an invoice. The remittance is a separate payment.
    let mut claim = submit(dec!(5000), dec!(5900));
    claim
        .attach_document(DocumentId::new(), "Discharge summary")
        .unwrap();
    apply_action(&mut claim, ClaimAction::SubmitToTpa, Utc::now()).unwrap();
    apply_action(
        &mut claim,
        ClaimAction::Approve {
            approved_amount: inr(dec!(4000)),
        },
        Utc::now(),
    )
    .unwrap();

    assert_eq!(claim.approved_amount, Some(inr(dec!(4000))));
    assert_eq!(claim.expected_coverage().amount(), dec!(4000));
}

#[test]
fn test_serde_round_trip() {
    let claim = submit(dec!(5000), dec!(5900));
    let json = serde_json::to_string(&claim).unwrap();
    let back: InsuranceClaim = serde_json::from_str(&json).unwrap();
    assert_eq!(back.claim_number, claim.claim_number);
    assert_eq!(back.status, ClaimStatus::Submitted);
    assert_eq!(back.claim_amount, claim.claim_amount);
}
