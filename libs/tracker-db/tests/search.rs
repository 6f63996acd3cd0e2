#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{PROJECT, connect, engine, insert, principal, reader, seed, seqs, ticket, tickets};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracker_db::TicketRowSource;
use tracker_db::entity::ticket::{Column as TicketColumn, Entity as Tickets};
use tracker_search::ast::field;
use tracker_search::{
    CompositeKey, KeyRange, KeyValue, MemoryRowSource, OrderKey, OrderingSpec, RowSource,
    SearchConfig, SearchEngine, SearchError, SearchKind, Seek, SortDir, ValidationError, compose,
};
use tracker_security::{Permission, ProjectId, ScopedPermission, TicketId};

fn by_seq() -> OrderingSpec {
    OrderingSpec::new(vec![OrderKey::asc("seq")]).unwrap()
}

#[tokio::test]
async fn scenario_a_clamps_at_both_ends() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 350)).await;
    let mut handle = engine(conn)
        .begin_search(&reader(), None, &by_seq(), Some(100))
        .await
        .unwrap();

    let first = handle.page_current().await.unwrap();
    assert_eq!(seqs(&first), (1..=100).collect::<Vec<_>>());

    let mut sizes = Vec::new();
    for _ in 0..4 {
        sizes.push(handle.page_next().await.unwrap().items.len());
    }
    assert_eq!(sizes, vec![100, 100, 50, 50]);
    assert_eq!(
        seqs(&handle.page_current().await.unwrap()),
        (301..=350).collect::<Vec<_>>()
    );

    for _ in 0..4 {
        handle.page_previous().await.unwrap();
    }
    assert_eq!(handle.page_current().await.unwrap(), first);
}

#[tokio::test]
async fn scenario_b_last_page_is_partial() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 101)).await;
    let mut handle = engine(conn)
        .begin_search(&reader(), None, &by_seq(), Some(30))
        .await
        .unwrap();

    assert_eq!(handle.page_count(), 4);
    let last = handle.page_jump(4).await.unwrap();
    assert_eq!(seqs(&last), (91..=101).collect::<Vec<_>>());
    assert_eq!(handle.page_next().await.unwrap(), last);
}

#[tokio::test]
async fn scenario_c_ticket_grants_restrict_rows() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 100)).await;
    let engine = engine(conn);

    let nobody = principal([ScopedPermission::global(Permission::ProjectCreate)]);
    let handle = engine.begin_search(&nobody, None, &by_seq(), Some(25)).await.unwrap();
    assert_eq!(handle.total_hint(), 0);
    assert!(handle.page_current().await.unwrap().items.is_empty());

    let some = principal(
        (20..80).map(|s| ScopedPermission::ticket(TicketId::new(PROJECT, s), Permission::TicketRead)),
    );
    let mut handle = engine.begin_search(&some, None, &by_seq(), Some(25)).await.unwrap();
    assert_eq!(handle.total_hint(), 60);
    let mut seen = seqs(&handle.page_current().await.unwrap());
    for _ in 1..handle.page_count() {
        seen.extend(seqs(&handle.page_next().await.unwrap()));
    }
    assert_eq!(seen, (20..80).collect::<Vec<_>>());
}

#[tokio::test]
async fn scenario_d_descending_reverses_sequence() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 100)).await;
    let engine = engine(conn);

    let mut runs = Vec::new();
    for dir in [SortDir::Asc, SortDir::Desc] {
        let order = OrderingSpec::new(vec![OrderKey::new("seq", dir)]).unwrap();
        let mut handle = engine.begin_search(&reader(), None, &order, Some(9)).await.unwrap();
        let mut out = seqs(&handle.page_current().await.unwrap());
        for _ in 1..handle.page_count() {
            out.extend(seqs(&handle.page_next().await.unwrap()));
        }
        runs.push(out);
    }
    let mut down = runs.pop().unwrap();
    let up = runs.pop().unwrap();
    assert_eq!(up.len(), 100);
    down.reverse();
    assert_eq!(up, down);
}

#[tokio::test]
async fn project_grants_and_search_kind_are_pushed_down() {
    let conn = connect().await;
    let mut rows = tickets(PROJECT, 10);
    rows.extend(tickets(ProjectId(2), 15));
    seed(&conn, rows).await;

    let member = principal([
        ScopedPermission::project(ProjectId(2), Permission::TicketRead),
        ScopedPermission::ticket(TicketId::new(PROJECT, 4), Permission::TicketRead),
    ]);
    let handle = engine(conn.clone())
        .begin_search(&member, None, &by_seq(), Some(100))
        .await
        .unwrap();
    let page = handle.page_current().await.unwrap();
    assert_eq!(page.items.len(), 16);
    assert_eq!(
        page.items.iter().filter(|t| t.project_id == PROJECT.0).count(),
        1
    );

    let writes = engine(conn).with_kind(SearchKind::TicketsForUpdate);
    let handle = writes.begin_search(&member, None, &by_seq(), Some(100)).await.unwrap();
    assert_eq!(handle.total_hint(), 0);
}

#[tokio::test]
async fn duplicate_sort_values_are_broken_by_tiebreakers() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 50)).await;
    let order = OrderingSpec::new(vec![OrderKey::desc("title")]).unwrap();
    let mut handle = engine(conn)
        .begin_search(&reader(), None, &order, Some(4))
        .await
        .unwrap();

    let mut seen = Vec::new();
    seen.extend(handle.page_current().await.unwrap().items);
    for _ in 1..handle.page_count() {
        seen.extend(handle.page_next().await.unwrap().items);
    }
    assert_eq!(seen.len(), 50);
    assert!(seen.windows(2).all(|w| {
        w[0].title > w[1].title || (w[0].title == w[1].title && w[0].seq < w[1].seq)
    }));
}

#[tokio::test]
async fn concurrent_writes_never_duplicate_or_drop_rows() {
    let conn = connect().await;
    seed(&conn, (1..=30).map(|i| ticket(PROJECT, i * 10)).collect()).await;
    let mut handle = engine(conn.clone())
        .begin_search(&reader(), None, &by_seq(), Some(10))
        .await
        .unwrap();
    let page1 = handle.page_current().await.unwrap();

    insert(&conn, ticket(PROJECT, 155)).await;
    Tickets::delete_many()
        .filter(TicketColumn::Seq.eq(250))
        .exec(&conn)
        .await
        .unwrap();

    let page2 = handle.page_next().await.unwrap();
    let page3 = handle.page_next().await.unwrap();
    assert!(page2.items.len() <= handle.page_size());
    assert!(seqs(&page2).contains(&155));
    assert!(!seqs(&page3).contains(&250));

    let all: Vec<i64> = [page1, page2, page3].iter().flat_map(seqs).collect();
    assert!(all.windows(2).all(|w| w[0] < w[1]));
    // the insert pushes 200 off page 2
    assert_eq!(all.len(), 29);
    assert!(!all.contains(&200));
}

#[tokio::test]
async fn inserts_never_grow_a_page_past_its_size() {
    let conn = connect().await;
    seed(&conn, (1..=30).map(|i| ticket(PROJECT, i * 1000)).collect()).await;
    let mut handle = engine(conn.clone())
        .begin_search(&reader(), None, &by_seq(), Some(10))
        .await
        .unwrap();

    seed(&conn, (11_001..11_500).map(|seq| ticket(PROJECT, seq)).collect()).await;

    let page2 = handle.page_next().await.unwrap();
    assert_eq!(page2.items.len(), 10);
    assert_eq!(page2.first_offset, 10);
    assert_eq!(seqs(&page2), [11_000].into_iter().chain(11_001..11_010).collect::<Vec<_>>());

    let page3 = handle.page_next().await.unwrap();
    assert_eq!(seqs(&page3), (21..=30).map(|i| i * 1000).collect::<Vec<_>>());
}

#[tokio::test]
async fn engine_without_tiebreaker_is_rejected() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 25)).await;
    let bare = SearchEngine::new(
        Arc::new(TicketRowSource::for_tickets(conn)),
        SearchConfig::default(),
    );

    for order in [OrderingSpec::empty().clone(), by_seq()] {
        let err = bare
            .begin_search(&reader(), None, &order, Some(10))
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::Validation(ValidationError::MissingTiebreaker));
    }
}

#[tokio::test]
async fn empty_ordering_pages_by_tiebreakers() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 25)).await;
    let mut handle = engine(conn)
        .begin_search(&reader(), None, OrderingSpec::empty(), Some(10))
        .await
        .unwrap();
    assert_eq!(handle.page_count(), 3);

    let first = handle.page_current().await.unwrap();
    let mut sizes = vec![first.items.len()];
    let mut seen = seqs(&first);
    for _ in 1..handle.page_count() {
        let page = handle.page_next().await.unwrap();
        sizes.push(page.items.len());
        seen.extend(seqs(&page));
    }
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(seen, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn ties_on_a_non_unique_column_stay_on_their_page() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 20)).await;
    let by_status = OrderingSpec::new(vec![OrderKey::asc("status")]).unwrap();
    let mut handle = engine(conn)
        .begin_search(&reader(), None, &by_status, Some(4))
        .await
        .unwrap();
    assert_eq!(handle.page_count(), 5);

    let mut pages = vec![seqs(&handle.page_current().await.unwrap())];
    for _ in 1..handle.page_count() {
        pages.push(seqs(&handle.page_next().await.unwrap()));
    }
    assert!(pages.iter().all(|p| p.len() == 4), "{pages:?}");

    let all: Vec<i64> = pages.concat();
    let expected: Vec<i64> = (1..=20).step_by(2).chain((2..=20).step_by(2)).collect();
    assert_eq!(all, expected);
}

#[tokio::test]
async fn key_scan_rejects_an_empty_ordering() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 3)).await;
    let source = TicketRowSource::for_tickets(conn);
    let filter = compose(&reader(), None, Permission::TicketRead);

    let err = source.scan_keys(&filter, OrderingSpec::empty()).await.unwrap_err();
    assert_eq!(err, SearchError::Validation(ValidationError::EmptyOrder));
}

#[tokio::test]
async fn strict_seek_excludes_the_last_seen_row() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 10)).await;
    let source = TicketRowSource::for_tickets(conn);
    let filter = compose(&reader(), None, Permission::TicketRead);
    let after = KeyRange::from_seek(Seek::After(CompositeKey(vec![KeyValue::I64(4)])));

    let rows = source.fetch_rows(&filter, &by_seq(), &after, 3).await.unwrap();
    assert_eq!(rows.iter().map(|t| t.seq).collect::<Vec<_>>(), vec![5, 6, 7]);
}

#[tokio::test]
async fn snapshot_resumes_against_the_database() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 40)).await;
    let order = OrderingSpec::new(vec![OrderKey::desc("created_at")]).unwrap();
    let filter = || Some(field("status").eq("open"));

    let mut handle = engine(conn.clone())
        .begin_search(&reader(), filter(), &order, Some(6))
        .await
        .unwrap();
    let page2 = handle.page_next().await.unwrap();
    let token = handle.snapshot().encode().unwrap();

    let resumed = engine(conn)
        .resume(&reader(), filter(), &order, &token)
        .unwrap();
    assert_eq!(resumed.page_current().await.unwrap(), page2);
    assert_eq!(seqs(&page2), vec![28, 26, 24, 22, 20, 18]);
}

#[tokio::test]
async fn matches_the_in_memory_source() {
    let conn = connect().await;
    let mut rows = tickets(PROJECT, 60);
    rows.extend(tickets(ProjectId(7), 25));
    seed(&conn, rows.clone()).await;

    let db = engine(conn);
    let mem = SearchEngine::new(Arc::new(MemoryRowSource::new(rows)), SearchConfig::default())
        .with_tiebreaker("project_id", SortDir::Asc)
        .with_tiebreaker("seq", SortDir::Asc);

    let who = principal([
        ScopedPermission::project(ProjectId(7), Permission::TicketRead),
        ScopedPermission::ticket(TicketId::new(PROJECT, 3), Permission::TicketRead),
        ScopedPermission::ticket(TicketId::new(PROJECT, 33), Permission::TicketRead),
        ScopedPermission::ticket(TicketId::new(PROJECT, 34), Permission::TicketRead),
    ]);
    let cases = [
        (None, vec![OrderKey::asc("title")]),
        (
            Some(field("status").eq("closed").or(field("seq").in_list([3_i64, 4]))),
            vec![OrderKey::desc("reporter"), OrderKey::asc("created_at")],
        ),
        (Some(field("title").ends_with("2")), vec![OrderKey::desc("seq")]),
        (Some(!field("seq").le(10_i64)), vec![OrderKey::asc("status"), OrderKey::desc("title")]),
    ];

    for (filter, keys) in cases {
        let order = OrderingSpec::new(keys).unwrap();
        for (who, size) in [(&who, 4), (&reader(), 7)] {
            let mut a = db.begin_search(who, filter.clone(), &order, Some(size)).await.unwrap();
            let mut b = mem.begin_search(who, filter.clone(), &order, Some(size)).await.unwrap();
            assert_eq!(a.page_count(), b.page_count(), "{order}");
            assert_eq!(a.boundaries(), b.boundaries(), "{order}");
            assert_eq!(a.page_current().await.unwrap(), b.page_current().await.unwrap());
            for _ in 1..a.page_count() {
                assert_eq!(
                    a.page_next().await.unwrap(),
                    b.page_next().await.unwrap(),
                    "{order}"
                );
            }
        }
    }
}

#[tokio::test]
async fn bad_filters_surface_as_errors() {
    let conn = connect().await;
    seed(&conn, tickets(PROJECT, 3)).await;
    let engine = engine(conn);

    let err = engine
        .begin_search(&reader(), Some(field("priority").eq(1_i64)), &by_seq(), None)
        .await
        .unwrap_err();
    assert_eq!(err, SearchError::UnknownField("priority".into()));

    let err = engine
        .begin_search(&reader(), Some(field("seq").eq("one")), &by_seq(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::TypeMismatch { .. }));
}
