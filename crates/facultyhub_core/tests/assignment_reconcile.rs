use facultyhub_core::db::open_db_in_memory;
use facultyhub_core::{
    reconcile_assignments, Assignment, AssignmentService, AssignmentStore, CatalogRepository,
    Course, Faculty, FacultyRepository, NewCourse, NewFaculty, ReconcileError,
    SqliteAssignmentStore, SqliteCatalogRepository, SqliteFacultyRepository,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed_course(conn: &Connection, code: &str) -> Course {
    SqliteCatalogRepository::new(conn)
        .create_course(&NewCourse {
            code: code.to_string(),
            name: format!("{code} lecture"),
            credits: 4,
            capacity: 60,
            ..NewCourse::default()
        })
        .unwrap()
}

fn seed_faculty(conn: &Connection, first: &str, last: &str) -> Faculty {
    let catalog = SqliteCatalogRepository::new(conn);
    let department = match catalog.list_departments().unwrap().into_iter().next() {
        Some(department) => department,
        None => catalog.create_department("Computer Science", 40).unwrap(),
    };
    SqliteFacultyRepository::new(conn)
        .create_faculty(&NewFaculty {
            employee_id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.edu", first.to_lowercase(), last.to_lowercase()),
            title: "Lecturer".to_string(),
            photograph_path: None,
            department_id: department.id,
        })
        .unwrap()
}

fn reconcile(
    conn: &mut Connection,
    faculty: &Faculty,
    desired: &[i64],
) -> Result<Vec<Assignment>, ReconcileError> {
    AssignmentService::new(conn).reconcile(faculty.id, desired)
}

fn held_course_ids(conn: &Connection, faculty: &Faculty) -> Vec<i64> {
    SqliteAssignmentStore::new(conn)
        .assignments_for_faculty(faculty.id)
        .unwrap()
        .into_iter()
        .map(|assignment| assignment.course_id)
        .collect()
}

fn faculty_name_of(conn: &Connection, course: &Course) -> Option<String> {
    SqliteCatalogRepository::new(conn)
        .get_course(course.id)
        .unwrap()
        .unwrap()
        .faculty_name
}

fn assert_consistent(conn: &Connection) {
    let drift = SqliteAssignmentStore::new(conn)
        .find_faculty_name_drift()
        .unwrap();
    assert!(drift.is_empty(), "faculty_name drift: {drift:?}");
}

#[test]
fn adding_a_course_claims_it_and_copies_the_faculty_name() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let c10 = seed_course(&conn, "CS110");
    let c11 = seed_course(&conn, "CS111");
    reconcile(&mut conn, &faculty, &[c10.id]).unwrap();

    let claimed = reconcile(&mut conn, &faculty, &[c10.id, c11.id]).unwrap();

    assert_eq!(claimed.len(), 2);
    assert_eq!(held_course_ids(&conn, &faculty), vec![c10.id, c11.id]);
    assert_eq!(
        faculty_name_of(&conn, &c11).as_deref(),
        Some("Grace Hopper")
    );
    assert_consistent(&conn);
}

#[test]
fn empty_desired_set_releases_every_course() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let c10 = seed_course(&conn, "CS110");
    let c11 = seed_course(&conn, "CS111");
    reconcile(&mut conn, &faculty, &[c10.id, c11.id]).unwrap();

    let claimed = reconcile(&mut conn, &faculty, &[]).unwrap();

    assert!(claimed.is_empty());
    assert!(held_course_ids(&conn, &faculty).is_empty());
    assert_eq!(faculty_name_of(&conn, &c10), None);
    assert_eq!(faculty_name_of(&conn, &c11), None);
    assert_consistent(&conn);
}

#[test]
fn reconciling_to_the_current_set_changes_nothing() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let c10 = seed_course(&conn, "CS110");
    let c11 = seed_course(&conn, "CS111");
    seed_course(&conn, "CS112");
    reconcile(&mut conn, &faculty, &[c11.id, c10.id]).unwrap();

    let assignments_before = SqliteAssignmentStore::new(&conn)
        .list_assignments()
        .unwrap();
    let courses_before = SqliteCatalogRepository::new(&conn).list_courses().unwrap();

    let current = AssignmentService::new(&mut conn)
        .current_course_ids(faculty.id)
        .unwrap();
    reconcile(&mut conn, &faculty, &current).unwrap();

    let assignments_after = SqliteAssignmentStore::new(&conn)
        .list_assignments()
        .unwrap();
    let courses_after = SqliteCatalogRepository::new(&conn).list_courses().unwrap();
    assert_eq!(assignments_before, assignments_after);
    assert_eq!(courses_before, courses_after);
}

#[test]
fn faculty_can_reclaim_a_course_it_already_holds() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let course = seed_course(&conn, "CS110");
    reconcile(&mut conn, &faculty, &[course.id]).unwrap();

    let claimed = reconcile(&mut conn, &faculty, &[course.id]).unwrap();

    assert_eq!(
        claimed,
        vec![Assignment {
            faculty_id: faculty.id,
            course_id: course.id
        }]
    );
    assert_consistent(&conn);
}

#[test]
fn missing_course_rolls_back_the_release() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let c10 = seed_course(&conn, "CS110");
    let c11 = seed_course(&conn, "CS111");
    reconcile(&mut conn, &faculty, &[c10.id]).unwrap();

    let err = reconcile(&mut conn, &faculty, &[c11.id, 9_999]).unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::CoursesNotFound {
            expected: 2,
            found: 1
        }
    ));
    assert_eq!(held_course_ids(&conn, &faculty), vec![c10.id]);
    assert_eq!(
        faculty_name_of(&conn, &c10).as_deref(),
        Some("Grace Hopper")
    );
    assert_eq!(faculty_name_of(&conn, &c11), None);
}

#[test]
fn course_held_by_another_faculty_is_rejected_without_side_effects() {
    let mut conn = setup();
    let holder = seed_faculty(&conn, "Grace", "Hopper");
    let requester = seed_faculty(&conn, "Alan", "Turing");
    let contested = seed_course(&conn, "CS110");
    let own = seed_course(&conn, "CS120");
    reconcile(&mut conn, &holder, &[contested.id]).unwrap();
    reconcile(&mut conn, &requester, &[own.id]).unwrap();

    let err = reconcile(&mut conn, &requester, &[contested.id]).unwrap_err();

    match err {
        ReconcileError::CourseAlreadyAssigned {
            course_id,
            course_name,
            course_code,
        } => {
            assert_eq!(course_id, contested.id);
            assert_eq!(course_name, "CS110 lecture");
            assert_eq!(course_code, "CS110");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(held_course_ids(&conn, &holder), vec![contested.id]);
    assert_eq!(held_course_ids(&conn, &requester), vec![own.id]);
    assert_eq!(
        faculty_name_of(&conn, &contested).as_deref(),
        Some("Grace Hopper")
    );
    assert_eq!(faculty_name_of(&conn, &own).as_deref(), Some("Alan Turing"));
}

#[test]
fn conflict_report_follows_supplied_order() {
    let mut conn = setup();
    let holder = seed_faculty(&conn, "Grace", "Hopper");
    let requester = seed_faculty(&conn, "Alan", "Turing");
    let first = seed_course(&conn, "CS110");
    let second = seed_course(&conn, "CS111");
    reconcile(&mut conn, &holder, &[first.id, second.id]).unwrap();

    for (desired, expected) in [
        (vec![second.id, first.id], second.id),
        (vec![first.id, second.id], first.id),
    ] {
        let err = reconcile(&mut conn, &requester, &desired).unwrap_err();
        assert!(
            matches!(err, ReconcileError::CourseAlreadyAssigned { course_id, .. } if course_id == expected)
        );
    }
}

#[test]
fn duplicate_ids_collapse_to_one_assignment() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let course = seed_course(&conn, "CS110");

    let claimed = reconcile(&mut conn, &faculty, &[course.id, course.id, course.id]).unwrap();

    assert_eq!(claimed.len(), 1);
    assert_eq!(held_course_ids(&conn, &faculty), vec![course.id]);
}

#[test]
fn courses_can_be_swapped_within_one_faculty() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let c10 = seed_course(&conn, "CS110");
    let c11 = seed_course(&conn, "CS111");
    let c12 = seed_course(&conn, "CS112");
    reconcile(&mut conn, &faculty, &[c10.id, c11.id]).unwrap();

    reconcile(&mut conn, &faculty, &[c12.id, c11.id]).unwrap();

    assert_eq!(held_course_ids(&conn, &faculty), vec![c11.id, c12.id]);
    assert_eq!(faculty_name_of(&conn, &c10), None);
    assert_consistent(&conn);
}

#[test]
fn released_course_can_be_claimed_by_someone_else() {
    let mut conn = setup();
    let first = seed_faculty(&conn, "Grace", "Hopper");
    let second = seed_faculty(&conn, "Alan", "Turing");
    let course = seed_course(&conn, "CS110");
    reconcile(&mut conn, &first, &[course.id]).unwrap();
    reconcile(&mut conn, &first, &[]).unwrap();

    reconcile(&mut conn, &second, &[course.id]).unwrap();

    assert_eq!(
        faculty_name_of(&conn, &course).as_deref(),
        Some("Alan Turing")
    );
    assert_consistent(&conn);
}

#[test]
fn unknown_faculty_is_reported() {
    let mut conn = setup();
    let course = seed_course(&conn, "CS110");

    let err = AssignmentService::new(&mut conn)
        .reconcile(404, &[course.id])
        .unwrap_err();

    assert!(matches!(err, ReconcileError::FacultyNotFound(404)));
}

#[test]
fn engine_leaves_commit_to_the_caller() {
    let mut conn = setup();
    let faculty = seed_faculty(&conn, "Grace", "Hopper");
    let c10 = seed_course(&conn, "CS110");
    let c11 = seed_course(&conn, "CS111");
    reconcile(&mut conn, &faculty, &[c10.id]).unwrap();

    {
        let tx = conn.transaction().unwrap();
        reconcile_assignments(
            &SqliteAssignmentStore::new(&tx),
            &SqliteCatalogRepository::new(&tx),
            &faculty,
            &[c11.id],
        )
        .unwrap();
        assert_eq!(held_course_ids(&tx, &faculty), vec![c11.id]);
        // Dropped without commit.
    }

    assert_eq!(held_course_ids(&conn, &faculty), vec![c10.id]);
    assert_consistent(&conn);
}

fn first_held_by_other(
    holders: &BTreeMap<i64, i64>,
    member: &Faculty,
    desired: &[i64],
) -> Option<i64> {
    desired
        .iter()
        .copied()
        .find(|course_id| matches!(holders.get(course_id), Some(holder) if *holder != member.id))
}

#[test]
fn many_moves_follow_the_first_claim_wins_model() {
    let mut conn = setup();
    let faculty: Vec<Faculty> = [("Grace", "Hopper"), ("Alan", "Turing"), ("Ada", "Lovelace")]
        .into_iter()
        .map(|(first, last)| seed_faculty(&conn, first, last))
        .collect();
    let courses: Vec<Course> = (0..6)
        .map(|idx| seed_course(&conn, &format!("CS2{idx:02}")))
        .collect();

    // course id -> holder id
    let mut expected: BTreeMap<i64, i64> = BTreeMap::new();
    let (mut accepted, mut rejected) = (0, 0);
    for round in 0..9 {
        let member = &faculty[round % faculty.len()];
        let desired: Vec<i64> = courses
            .iter()
            .skip(round % 4)
            .step_by(2)
            .map(|course| course.id)
            .collect();

        let blocked = first_held_by_other(&expected, member, &desired);
        let result = reconcile(&mut conn, member, &desired);
        match blocked {
            Some(course_id) => {
                rejected += 1;
                let conflict_on = match &result {
                    Err(ReconcileError::CourseAlreadyAssigned { course_id, .. }) => Some(*course_id),
                    _ => None,
                };
                assert_eq!(conflict_on, Some(course_id), "round {round}");
            }
            None => {
                accepted += 1;
                assert_eq!(result.unwrap().len(), desired.len(), "round {round}");
                expected.retain(|_, holder| *holder != member.id);
                expected.extend(desired.iter().map(|course_id| (*course_id, member.id)));
            }
        }

        let actual: BTreeMap<i64, i64> = SqliteAssignmentStore::new(&conn)
            .list_assignments()
            .unwrap()
            .into_iter()
            .map(|assignment| (assignment.course_id, assignment.faculty_id))
            .collect();
        assert_eq!(actual, expected, "round {round}");
        assert_consistent(&conn);
    }

    assert!(accepted > 0 && rejected > 0);
}
