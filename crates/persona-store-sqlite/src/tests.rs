//! Integration tests for `SqliteStore` against an in-memory database.

use std::{
  collections::HashSet,
  sync::atomic::{AtomicI64, Ordering},
  time::Duration,
};

use persona_core::{
  curp::current_year,
  matricula,
  persona::{Gender, NewPersona},
  store::{Page, PersonaLookup, PersonaStore},
};

use crate::{Error, MATRICULA_ATTEMPTS, SqliteStore, StoreTimeouts};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_persona(curp: &str) -> NewPersona {
  NewPersona {
    nombres:          "Juan Carlos".into(),
    apellido_paterno: "Pérez".into(),
    apellido_materno: "Gómez".into(),
    curp:             curp.into(),
  }
}

/// A distinct, well-formed CURP per index.
fn curp_for(i: usize) -> String { format!("PEGJ990101H{i:07}") }

fn domain(err: Error) -> persona_core::Error { err.into() }

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_derives_fields() {
  let s = store().await;

  let p = s.create(new_persona("ABCD990101HDFRRN09")).await.unwrap();
  assert_eq!(p.genero, Gender::Hombre);
  assert_eq!(p.fecha_nacimiento, "1999-01-01");
  assert_eq!(p.edad, current_year() - 1999);
  assert!(matricula::is_valid(p.matricula));
}

#[tokio::test]
async fn create_then_find_by_curp_and_matricula() {
  let s = store().await;
  let created = s.create(new_persona("LORA850315MDFPZN01")).await.unwrap();

  let by_curp = s
    .find(PersonaLookup::Curp("LORA850315MDFPZN01".into()))
    .await
    .unwrap();
  assert_eq!(by_curp, created);

  let by_matricula = s
    .find(PersonaLookup::Matricula(created.matricula))
    .await
    .unwrap();
  assert_eq!(by_matricula, created);
}

#[tokio::test]
async fn duplicate_curp_is_rejected_and_not_written() {
  let s = store().await;
  s.create(new_persona("ABCD990101HDFRRN09")).await.unwrap();

  let err = s.create(new_persona("ABCD990101HDFRRN09")).await.unwrap_err();
  assert!(matches!(
    domain(err),
    persona_core::Error::DuplicateCurp(c) if c == "ABCD990101HDFRRN09"
  ));

  let all = s.list(Page::new(Some(1), Some(100))).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn invalid_curp_is_rejected_and_not_written() {
  let s = store().await;

  let err = s.create(new_persona("ABC")).await.unwrap_err();
  assert!(matches!(domain(err), persona_core::Error::InvalidCurp(..)));

  assert!(s.list(Page::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_creates_of_one_curp_store_it_once() {
  let s = store().await;

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.create(new_persona("RACE000101MDFRRN00")).await })
    })
    .collect();

  let mut ok = 0;
  let mut duplicates = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => ok += 1,
      Err(e) => {
        assert!(matches!(domain(e), persona_core::Error::DuplicateCurp(_)));
        duplicates += 1;
      }
    }
  }
  assert_eq!(ok, 1);
  assert_eq!(duplicates, 7);
}

// ─── Matrícula collisions ────────────────────────────────────────────────────

static CALLS: AtomicI64 = AtomicI64::new(0);

/// Returns `MIN` for the first two draws, then fresh values.
fn collide_once() -> i64 {
  let n = CALLS.fetch_add(1, Ordering::SeqCst);
  if n < 2 { matricula::MIN } else { matricula::MIN + n }
}

fn always_min() -> i64 { matricula::MIN }

#[tokio::test]
async fn matricula_collision_draws_again() {
  let s = store().await.with_matricula_source(collide_once);

  let first = s.create(new_persona(&curp_for(1))).await.unwrap();
  let second = s.create(new_persona(&curp_for(2))).await.unwrap();

  assert_eq!(first.matricula, matricula::MIN);
  assert_ne!(second.matricula, first.matricula);
}

#[tokio::test]
async fn matricula_exhaustion_is_store_unavailable() {
  let s = store().await.with_matricula_source(always_min);
  s.create(new_persona(&curp_for(1))).await.unwrap();

  let err = s.create(new_persona(&curp_for(2))).await.unwrap_err();
  assert!(matches!(err, Error::MatriculaExhausted(n) if n == MATRICULA_ATTEMPTS));
  assert!(matches!(
    domain(err),
    persona_core::Error::StoreUnavailable(_)
  ));
}

// ─── Find ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_missing_is_not_found() {
  let s = store().await;
  s.create(new_persona("ABCD990101HDFRRN09")).await.unwrap();

  let err = s
    .find(PersonaLookup::Curp("ZZZZ990101HDFRRN09".into()))
    .await
    .unwrap_err();
  assert!(matches!(domain(err), persona_core::Error::NotFound));

  let err = s.find(PersonaLookup::Matricula(1)).await.unwrap_err();
  assert!(matches!(domain(err), persona_core::Error::NotFound));
}

// ─── List ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_pages_in_storage_order() {
  let s = store().await;
  for i in 0..25 {
    s.create(new_persona(&curp_for(i))).await.unwrap();
  }

  let p1 = s.list(Page::new(Some(1), Some(10))).await.unwrap();
  let p2 = s.list(Page::new(Some(2), Some(10))).await.unwrap();
  let p3 = s.list(Page::new(Some(3), Some(10))).await.unwrap();
  let p4 = s.list(Page::new(Some(4), Some(10))).await.unwrap();

  assert_eq!(p1.len(), 10);
  assert_eq!(p2.len(), 10);
  assert_eq!(p3.len(), 5);
  assert!(p4.is_empty());

  let curps: Vec<String> = p1
    .iter()
    .chain(&p2)
    .chain(&p3)
    .map(|p| p.curp.clone())
    .collect();
  let expected: Vec<String> = (0..25).map(curp_for).collect();
  assert_eq!(curps, expected);

  let unique: HashSet<&String> = curps.iter().collect();
  assert_eq!(unique.len(), 25);
}

#[tokio::test]
async fn list_defaults_to_ten() {
  let s = store().await;
  for i in 0..12 {
    s.create(new_persona(&curp_for(i))).await.unwrap();
  }
  assert_eq!(s.list(Page::new(None, None)).await.unwrap().len(), 10);
}

// ─── Timeouts and cancellation ───────────────────────────────────────────────

fn short(write_ms: u64, read_ms: u64) -> StoreTimeouts {
  StoreTimeouts {
    write: Duration::from_millis(write_ms),
    read:  Duration::from_millis(read_ms),
  }
}

/// Keep the connection thread busy for `busy`, returning once the blocking
/// closure is queued.
async fn occupy(s: &SqliteStore, busy: Duration) -> tokio::task::JoinHandle<crate::Result<()>> {
  let s = s.clone();
  let handle = tokio::spawn(async move { s.hold_connection(busy).await });
  tokio::time::sleep(Duration::from_millis(20)).await;
  handle
}

#[tokio::test]
async fn timed_out_create_writes_nothing() {
  let s = store().await.with_timeouts(short(50, 30_000));
  let busy = occupy(&s, Duration::from_millis(300)).await;

  let err = s.create(new_persona("TIME990101HDFRRN09")).await.unwrap_err();
  assert!(matches!(err, Error::Timeout(_)), "{err}");
  assert!(matches!(
    domain(err),
    persona_core::Error::StoreUnavailable(_)
  ));

  busy.await.unwrap().unwrap();

  let err = s
    .find(PersonaLookup::Curp("TIME990101HDFRRN09".into()))
    .await
    .unwrap_err();
  assert!(matches!(domain(err), persona_core::Error::NotFound));

  // The caller can retry without tripping over a ghost row.
  s.create(new_persona("TIME990101HDFRRN09")).await.unwrap();
}

#[tokio::test]
async fn timed_out_reads_are_store_unavailable() {
  let s = store().await;
  s.create(new_persona("READ990101MDFRRN09")).await.unwrap();
  let s = s.with_timeouts(short(5_000, 50));

  let busy = occupy(&s, Duration::from_millis(300)).await;
  let err = s.list(Page::default()).await.unwrap_err();
  assert!(matches!(err, Error::Timeout(_)), "{err}");
  busy.await.unwrap().unwrap();

  let busy = occupy(&s, Duration::from_millis(300)).await;
  let err = s
    .find(PersonaLookup::Curp("READ990101MDFRRN09".into()))
    .await
    .unwrap_err();
  assert!(matches!(
    domain(err),
    persona_core::Error::StoreUnavailable(_)
  ));
  busy.await.unwrap().unwrap();

  assert_eq!(s.list(Page::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn dropped_create_writes_nothing() {
  let s = store().await;
  let busy = occupy(&s, Duration::from_millis(300)).await;

  // The caller goes away while the insert is still queued.
  let gone = tokio::time::timeout(
    Duration::from_millis(50),
    s.create(new_persona("DROP990101HDFRRN09")),
  )
  .await;
  assert!(gone.is_err());

  busy.await.unwrap().unwrap();
  assert!(s.list(Page::default()).await.unwrap().is_empty());
}

#[test]
fn timeout_maps_to_store_unavailable() {
  let err = Error::Timeout(Duration::from_secs(5));
  assert!(matches!(
    domain(err),
    persona_core::Error::StoreUnavailable(msg) if msg.contains("timed out")
  ));
}
