use std::sync::Arc;

use progress_core::model::{
    ActivityBlock, AssessmentId, BlockId, CourseOutline, LessonId, OutlineLesson, OutlineUnit,
    StudentId, UnitId,
};
use progress_core::time::fixed_clock;
use progress_core::{CompletionEngine, CompletionState, LessonProgress, ProgressKey, UnitProgress};
use services::{AppServices, Clock, ProgressService, ProgressStore};
use storage::repository::{InMemoryRepository, Storage};

/// Unit 1: lesson 1 (two questions), lesson 2 (no activity).
/// Unit 2: lesson 1 (reading only), lesson 2 (one question).
/// Assessment `Mid` and a forum link.
fn outline() -> Arc<CourseOutline> {
    Arc::new(
        CourseOutline::new(vec![
            OutlineUnit::unit(
                UnitId::new(1),
                "Basics",
                vec![
                    OutlineLesson::with_activity(
                        LessonId::new(1),
                        "Intro",
                        vec![ActivityBlock::interactive(), ActivityBlock::interactive()],
                    ),
                    OutlineLesson::new(LessonId::new(2), "Reading"),
                ],
            ),
            OutlineUnit::unit(
                UnitId::new(2),
                "Advanced",
                vec![
                    OutlineLesson::with_activity(
                        LessonId::new(1),
                        "Warmup",
                        vec![ActivityBlock::static_content()],
                    ),
                    OutlineLesson::with_activity(
                        LessonId::new(2),
                        "Quiz",
                        vec![ActivityBlock::static_content(), ActivityBlock::interactive()],
                    ),
                ],
            ),
            OutlineUnit::assessment(AssessmentId::new("Mid").unwrap(), "Midterm"),
            OutlineUnit::link("forum", "Forum", Some("https://example.org/forum".into())),
        ])
        .unwrap(),
    )
}

fn service() -> Arc<ProgressService> {
    AppServices::with_storage(Storage::in_memory(), fixed_clock(), outline()).progress()
}

fn unit_state(units: &[UnitProgress], id: u64) -> CompletionState {
    units
        .iter()
        .find_map(|entry| match entry {
            UnitProgress::Unit { id: unit, state } if *unit == UnitId::new(id) => Some(*state),
            _ => None,
        })
        .expect("unit listed")
}

#[tokio::test]
async fn blocks_cascade_to_lesson_and_unit() {
    let svc = service();
    let student = StudentId::new(1);
    let (unit, lesson) = (UnitId::new(1), LessonId::new(1));

    svc.record_block_completed(student, unit, lesson, BlockId::new(0))
        .await
        .unwrap();
    let lessons = svc.lesson_progress(student, unit).await.unwrap();
    assert_eq!(lessons[0].state, CompletionState::InProgress);
    let units = svc.unit_progress(student).await.unwrap();
    assert_eq!(unit_state(&units, 1), CompletionState::InProgress);

    svc.record_block_completed(student, unit, lesson, BlockId::new(1))
        .await
        .unwrap();
    let record = svc.progress(student).await.unwrap();
    assert_eq!(
        record.progress().activity_state(unit, lesson),
        CompletionState::Completed
    );
    let lessons = svc.lesson_progress(student, unit).await.unwrap();
    assert_eq!(
        lessons,
        vec![
            LessonProgress {
                id: LessonId::new(1),
                state: CompletionState::Completed
            },
            LessonProgress {
                id: LessonId::new(2),
                state: CompletionState::NotStarted
            },
        ]
    );
    let units = svc.unit_progress(student).await.unwrap();
    assert_eq!(unit_state(&units, 1), CompletionState::Completed);
}

#[tokio::test]
async fn assessment_counter_grows_but_projection_stays_true() {
    let svc = service();
    let student = StudentId::new(1);
    let mid = AssessmentId::new("Mid").unwrap();

    svc.record_assessment_completed(student, mid.clone())
        .await
        .unwrap();
    let record = svc.progress(student).await.unwrap();
    assert!(record.progress().is_assessment_completed(&mid));

    svc.record_assessment_completed(student, mid.clone())
        .await
        .unwrap();
    let record = svc.progress(student).await.unwrap();
    assert!(record.progress().is_assessment_completed(&mid));
    assert_eq!(
        record.progress().count(&ProgressKey::assessment(mid.clone())),
        2
    );

    let units = svc.unit_progress(student).await.unwrap();
    assert!(units.contains(&UnitProgress::Assessment {
        id: mid,
        completed: true
    }));
}

#[tokio::test]
async fn fresh_student_reads_all_zero() {
    let svc = service();
    let student = StudentId::new(42);

    let lessons = svc.lesson_progress(student, UnitId::new(2)).await.unwrap();
    assert_eq!(lessons.len(), 2);
    assert!(
        lessons
            .iter()
            .all(|lesson| lesson.state == CompletionState::NotStarted)
    );

    let units = svc.unit_progress(student).await.unwrap();
    // links are not tracked
    assert_eq!(units.len(), 3);
    assert_eq!(unit_state(&units, 1), CompletionState::NotStarted);
    assert_eq!(unit_state(&units, 2), CompletionState::NotStarted);
}

#[tokio::test]
async fn reading_only_activity_completes_on_access() {
    let svc = service();
    let student = StudentId::new(1);

    svc.record_activity_accessed(student, UnitId::new(2), LessonId::new(1))
        .await
        .unwrap();
    let lessons = svc.lesson_progress(student, UnitId::new(2)).await.unwrap();
    assert_eq!(lessons[0].state, CompletionState::Completed);
    assert_eq!(
        unit_state(&svc.unit_progress(student).await.unwrap(), 2),
        CompletionState::InProgress
    );

    svc.record_block_completed(student, UnitId::new(2), LessonId::new(2), BlockId::new(1))
        .await
        .unwrap();
    assert_eq!(
        unit_state(&svc.unit_progress(student).await.unwrap(), 2),
        CompletionState::Completed
    );
}

#[tokio::test]
async fn repeating_events_keeps_composite_states() {
    let svc = service();
    let student = StudentId::new(1);
    let (unit, lesson) = (UnitId::new(1), LessonId::new(1));

    for _ in 0..2 {
        svc.record_block_completed(student, unit, lesson, BlockId::new(0))
            .await
            .unwrap();
        svc.record_block_completed(student, unit, lesson, BlockId::new(1))
            .await
            .unwrap();
    }
    svc.record_video_completed(student, unit, lesson).await.unwrap();
    svc.record_activity_completed(student, unit, lesson)
        .await
        .unwrap();

    let record = svc.progress(student).await.unwrap();
    let progress = record.progress();
    assert_eq!(progress.count(&ProgressKey::block(unit, lesson, BlockId::new(0))), 2);
    assert!(progress.is_video_completed(unit, lesson));
    assert_eq!(progress.activity_state(unit, lesson), CompletionState::Completed);
    assert_eq!(progress.lesson_state(unit, lesson), CompletionState::Completed);
    assert_eq!(progress.unit_state(unit), CompletionState::Completed);
}

#[tokio::test]
async fn students_progress_independently_in_parallel() {
    let svc = service();
    let (alice, bob) = (StudentId::new(1), StudentId::new(2));
    let (unit, lesson) = (UnitId::new(1), LessonId::new(1));

    let (a, b) = tokio::join!(
        svc.record_activity_completed(alice, unit, lesson),
        svc.record_block_completed(bob, unit, lesson, BlockId::new(0)),
    );
    a.unwrap();
    b.unwrap();

    let alice_units = svc.unit_progress(alice).await.unwrap();
    let bob_units = svc.unit_progress(bob).await.unwrap();
    assert_eq!(unit_state(&alice_units, 1), CompletionState::Completed);
    assert_eq!(unit_state(&bob_units, 1), CompletionState::InProgress);
}

/// Two overlapping requests for the same student load the same snapshot;
/// the later commit replaces the earlier one wholesale.
#[tokio::test]
async fn overlapping_writes_for_one_student_last_commit_wins() {
    let outline = outline();
    let repo = Arc::new(InMemoryRepository::new());
    let store = ProgressStore::new(Clock::fixed(progress_core::time::fixed_now()), repo);
    let engine = CompletionEngine::new(&*outline, &*outline);
    let student = StudentId::new(1);
    let (unit, lesson) = (UnitId::new(1), LessonId::new(1));

    let mut first = store.load_or_create(student).await.unwrap();
    let mut second = store.load_or_create(student).await.unwrap();

    engine
        .record(
            first.progress_mut(),
            &ProgressKey::block(unit, lesson, BlockId::new(0)),
        )
        .unwrap();
    engine
        .record(
            second.progress_mut(),
            &ProgressKey::block(unit, lesson, BlockId::new(1)),
        )
        .unwrap();
    store.commit(&mut first).await.unwrap();
    store.commit(&mut second).await.unwrap();

    let stored = store.load_or_create(student).await.unwrap();
    let progress = stored.progress();
    assert!(!progress.is_block_completed(unit, lesson, BlockId::new(0)));
    assert!(progress.is_block_completed(unit, lesson, BlockId::new(1)));
    assert_eq!(progress.activity_state(unit, lesson), CompletionState::InProgress);
}

#[tokio::test]
async fn sqlite_backed_progress_survives_reconnect() {
    let url = "sqlite:file:memdb_progress_flow?mode=memory&cache=shared";
    let first = AppServices::new_sqlite(url, fixed_clock(), outline())
        .await
        .expect("sqlite services");
    let student = StudentId::new(9);
    first
        .progress()
        .record_activity_completed(student, UnitId::new(1), LessonId::new(1))
        .await
        .unwrap();

    let second = AppServices::new_sqlite(url, fixed_clock(), outline())
        .await
        .expect("sqlite services");
    let units = second.progress().unit_progress(student).await.unwrap();
    assert_eq!(unit_state(&units, 1), CompletionState::Completed);

    let record = second.progress().progress(student).await.unwrap();
    assert_eq!(record.updated_on(), Some(progress_core::time::fixed_now()));
    drop(first);
}
