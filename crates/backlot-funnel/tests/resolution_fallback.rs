use backlot_funnel::{Funnel, FunnelConfig, ResolutionSource, ResolveError, NOT_AVAILABLE};
use backlot_model::{LeadId, LeadSubmission};
use backlot_store::{LeadStore, MemoryStore, StoreErrorKind};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    funnel: Funnel,
    store: Arc<MemoryStore>,
    _state: TempDir,
    _session: TempDir,
}

fn fixture() -> Fixture {
    let state = TempDir::new().expect("state dir");
    let session = TempDir::new().expect("session dir");
    let config = FunnelConfig {
        store_url: None,
        store_anon_key: None,
        maps_api_key: None,
        state_dir: PathBuf::from(state.path()),
        session_dir: PathBuf::from(session.path()),
    };
    let store = Arc::new(MemoryStore::new());
    let funnel = Funnel::new(config, Arc::clone(&store) as Arc<dyn LeadStore>);
    Fixture {
        funnel,
        store,
        _state: state,
        _session: session,
    }
}

fn boston_form() -> LeadSubmission {
    LeadSubmission {
        address: None,
        street: Some("123 Main St".to_string()),
        city: Some("Boston".to_string()),
        state: Some("MA".to_string()),
        zip_code: Some("02108".to_string()),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
    }
}

#[test]
fn submitted_lead_resolves_from_the_server_with_the_submitted_address() {
    let fx = fixture();
    let receipt = fx.funnel.submit(&boston_form()).expect("submit");

    let resolution = fx
        .funnel
        .resolve(Some(receipt.lead_id.clone()))
        .expect("resolve");
    assert_eq!(resolution.source, ResolutionSource::Server);
    assert_eq!(resolution.record.address, receipt.address);
    assert!(resolution.record.service_available);
}

#[test]
fn resolving_twice_with_no_writes_in_between_is_idempotent() {
    let fx = fixture();
    let receipt = fx.funnel.submit(&boston_form()).expect("submit");

    let first = fx.funnel.resolve(Some(receipt.lead_id.clone())).expect("first");
    let second = fx.funnel.resolve(Some(receipt.lead_id)).expect("second");
    assert_eq!(first.record, second.record);
}

#[test]
fn missing_identifier_is_recovered_from_the_session_slot() {
    let fx = fixture();
    let receipt = fx.funnel.submit(&boston_form()).expect("submit");

    let resolution = fx.funnel.resolve(None).expect("resolve without id");
    assert_eq!(resolution.source, ResolutionSource::Server);
    assert_eq!(resolution.record.id, receipt.lead_id);
}

#[test]
fn server_failure_falls_back_to_the_durable_mirror_as_a_pending_record() {
    let fx = fixture();
    let receipt = fx.funnel.submit(&boston_form()).expect("submit");
    fx.store.fail_fetch.store(true, Ordering::Relaxed);

    let resolution = fx
        .funnel
        .resolve(Some(receipt.lead_id))
        .expect("mirror fallback");
    assert_eq!(resolution.source, ResolutionSource::Mirror);
    assert_eq!(resolution.record.address, "123 Main St, Boston, MA 02108");
    assert_eq!(resolution.record.lot_size.as_deref(), Some(NOT_AVAILABLE));
    assert_eq!(resolution.record.zoning.as_deref(), Some(NOT_AVAILABLE));
    assert!(resolution.record.allows_adu);
    assert_eq!(
        resolution.record.additional_notes,
        vec!["Your property details are being processed.".to_string()]
    );
    assert!(
        resolution.record.service_available,
        "mirror gate derives from the snapshot's state"
    );
}

#[test]
fn connectivity_failure_takes_the_same_fallback_path() {
    let fx = fixture();
    let receipt = fx.funnel.submit(&boston_form()).expect("submit");
    fx.store.fail_connectivity.store(true, Ordering::Relaxed);

    let resolution = fx
        .funnel
        .resolve(Some(receipt.lead_id))
        .expect("mirror fallback");
    assert_eq!(resolution.source, ResolutionSource::Mirror);
}

#[test]
fn mirror_without_a_session_id_still_resolves_when_no_id_is_given() {
    let fx = fixture();
    // Insert fails, so the mirror holds a snapshot with no identifier.
    fx.store.fail_insert.store(true, Ordering::Relaxed);
    let _ = fx.funnel.submit(&boston_form());

    let resolution = fx.funnel.resolve(None).expect("mirror-only resolve");
    assert_eq!(resolution.source, ResolutionSource::Mirror);
    assert_eq!(resolution.record.id.as_str(), "pending");
    assert_eq!(fx.store.fetch_calls.load(Ordering::Relaxed), 0);
}

#[test]
fn no_identifier_and_no_mirror_is_a_terminal_error() {
    let fx = fixture();
    let err = fx.funnel.resolve(None).expect_err("nothing to resolve");
    assert_eq!(err, ResolveError::NoIdentifier);
    assert!(!err.to_string().is_empty());
}

#[test]
fn server_failure_with_no_mirror_reports_the_server_error() {
    let fx = fixture();
    fx.store.fail_connectivity.store(true, Ordering::Relaxed);

    let err = fx
        .funnel
        .resolve(Some(LeadId::parse("lead-000001").expect("id")))
        .expect_err("exhausted");
    match err {
        ResolveError::Exhausted { server } => {
            assert_eq!(server.kind, StoreErrorKind::Connectivity);
        }
        other => panic!("expected exhausted error, got {other}"),
    }
}

#[test]
fn unknown_id_with_no_mirror_is_not_found_at_the_end_of_the_chain() {
    let fx = fixture();
    let err = fx
        .funnel
        .resolve(Some(LeadId::parse("lead-999999").expect("id")))
        .expect_err("exhausted");
    match err {
        ResolveError::Exhausted { server } => {
            assert_eq!(server.kind, StoreErrorKind::NotFound);
        }
        other => panic!("expected exhausted error, got {other}"),
    }
}
