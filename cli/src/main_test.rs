use clap::CommandFactory;

use super::*;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn register_parses_role() {
    let cli = Cli::try_parse_from([
        "campus",
        "register",
        "--email",
        "a@school.test",
        "--password",
        "pw",
        "--full-name",
        "Ada",
        "--role",
        "Teacher",
    ])
    .unwrap();
    let Command::Register(args) = cli.command else {
        panic!("expected register");
    };
    assert_eq!(args.role, Role::Teacher);
    assert!(args.student_id.is_none());
}

#[test]
fn resolve_rejects_role_with_signed_in() {
    let parsed = Cli::try_parse_from(["campus", "resolve", "/", "--role", "student", "--signed-in"]);
    assert!(parsed.is_err());
}

#[test]
fn profile_args_map_to_sparse_update() {
    let cli = Cli::try_parse_from(["campus", "profile", "--phone", "555-0100"]).unwrap();
    let Command::Profile(args) = cli.command else {
        panic!("expected profile");
    };
    let update = ProfileUpdate::from(args);
    assert_eq!(update.phone.as_deref(), Some("555-0100"));
    assert!(update.full_name.is_none());
    assert!(!update.is_empty());
}

#[test]
fn route_json_reports_match_details() {
    let route = RouteTable::default()
        .resolve("/teacher/students/12", &AuthSnapshot::anonymous())
        .unwrap();
    let json = route_json(&route);
    assert_eq!(json["name"], "StudentDetail");
    assert_eq!(json["params"]["id"], "12");
    assert_eq!(json["role"], "teacher");
    assert_eq!(json["layouts"][0], "TeacherLayout");
    assert_eq!(json["requires_auth"], true);
}

#[test]
fn navigation_json_lists_hops() {
    let route = RouteTable::default().resolve("/login", &AuthSnapshot::anonymous()).unwrap();
    let nav = Navigation {
        route,
        hops: vec![campus::router::Hop {
            from: "/student".into(),
            to: "/login".into(),
            cause: campus::router::HopCause::Guard,
        }],
    };
    let json = navigation_json("/student", &nav);
    assert_eq!(json["requested"], "/student");
    assert_eq!(json["hops"][0]["cause"], "guard");
    assert_eq!(json["route"]["path"], "/login");
}
