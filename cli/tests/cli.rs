use anyhow::Result;
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

const DATA: &str = r#"<http://example.com/s> <http://example.com/p> "a"@en .
<http://example.com/s> <http://example.com/p> "b"@cs .
<http://example.com/s> <http://example.com/p> "c" .
<http://example.com/t> <http://example.com/p> <http://example.com/o> <http://example.com/g> .
"#;

fn cli_command() -> Command {
    let mut command = Command::cargo_bin("sparstep").unwrap();
    command.env("RUST_LOG", "warn");
    command
}

#[test]
fn cli_help() {
    cli_command()
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("sparstep"));
}

#[test]
fn cli_query_text() {
    cli_command()
        .arg("query")
        .arg("--subject")
        .arg("http://example.com/s")
        .arg("--lang")
        .arg("cs")
        .arg("--limit")
        .arg("10")
        .assert()
        .success()
        .stdout(
            "SELECT ?s ?p ?o
WHERE {
  VALUES ?s { <http://example.com/s> }
  FILTER(((isIRI(?o) || isBLANK(?o)) || (LANG(?o) = \"cs\")))
  ?s ?p ?o .
}
LIMIT 10
",
        );
}

#[test]
fn cli_query_graph_scope() {
    cli_command()
        .arg("query")
        .arg("--any-graph")
        .arg("--object-literal")
        .arg("1@http://www.w3.org/2001/XMLSchema#integer")
        .arg("--distinct")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("SELECT DISTINCT ?s ?p ?o ?g\n"))
        .stdout(predicate::str::contains("GRAPH ?g {"))
        .stdout(predicate::str::contains(
            "VALUES ?o { \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> }",
        ));
}

#[test]
fn cli_query_invalid_iri() {
    cli_command()
        .arg("query")
        .arg("--predicate")
        .arg("not an iri")
        .assert()
        .failure()
        .stderr(predicate::str::contains("The predicate IRI 'not an iri' is invalid"));
}

#[test]
fn cli_query_invalid_datatype() {
    cli_command()
        .arg("query")
        .arg("--object-literal")
        .arg("1@http://example.com/not an iri")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The object literal '1@http://example.com/not an iri' is invalid",
        ));
}

#[test]
fn cli_query_literal_with_at_sign() {
    cli_command()
        .arg("query")
        .arg("--object-literal")
        .arg("user@example.com")
        .arg("--object-literal")
        .arg("1@mailto:a@b.org")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "VALUES ?o { \"user@example.com\" \"1\"^^<mailto:a@b.org> }",
        ));
}

#[test]
fn cli_filter_languages() -> Result<()> {
    let dir = TempDir::new()?;
    let file = dir.child("data.nq");
    file.write_str(DATA)?;
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(file.path())
        .arg("--lang")
        .arg("cs")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<http://example.com/s> <http://example.com/p> \"b\"@cs .",
        ))
        .stdout(predicate::str::contains(
            "<http://example.com/t> <http://example.com/p> <http://example.com/o> <http://example.com/g> .",
        ))
        .stdout(predicate::str::contains("\"a\"@en").not())
        .stdout(predicate::str::contains("\"c\"").not());
    Ok(())
}

#[test]
fn cli_filter_graph_and_slice() -> Result<()> {
    let dir = TempDir::new()?;
    let file = dir.child("data.nq");
    file.write_str(DATA)?;
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(file.path())
        .arg("--graph")
        .arg("http://example.com/g")
        .assert()
        .success()
        .stdout(
            "<http://example.com/t> <http://example.com/p> <http://example.com/o> <http://example.com/g> .\n",
        );
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(file.path())
        .arg("--subject")
        .arg("http://example.com/s")
        .arg("--offset")
        .arg("1")
        .arg("--limit")
        .arg("1")
        .assert()
        .success()
        .stdout("<http://example.com/s> <http://example.com/p> \"b\"@cs .\n");
    Ok(())
}

#[test]
fn cli_filter_distinct() -> Result<()> {
    let dir = TempDir::new()?;
    let file = dir.child("data.nq");
    file.write_str(
        "<http://example.com/s> <http://example.com/p> \"a\" .
<http://example.com/s> <http://example.com/p> \"a\" <http://example.com/g> .
<http://example.com/s> <http://example.com/p> \"b\" .
",
    )?;
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(file.path())
        .arg("--distinct")
        .assert()
        .success()
        .stdout(
            "<http://example.com/s> <http://example.com/p> \"a\" .
<http://example.com/s> <http://example.com/p> \"b\" .
",
        );
    Ok(())
}

#[test]
fn cli_filter_sources_keep_order() -> Result<()> {
    let dir = TempDir::new()?;
    let first = dir.child("first.ttl");
    first.write_str("<http://example.com/a> <http://example.com/p> <http://example.com/o> .")?;
    let second = dir.child("second.nt");
    second.write_str("<http://example.com/b> <http://example.com/p> <http://example.com/o> .\n")?;
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(second.path())
        .arg("--file")
        .arg(first.path())
        .assert()
        .success()
        .stdout(
            "<http://example.com/b> <http://example.com/p> <http://example.com/o> .
<http://example.com/a> <http://example.com/p> <http://example.com/o> .
",
        );
    Ok(())
}

#[test]
fn cli_filter_skips_failing_source() -> Result<()> {
    let dir = TempDir::new()?;
    let valid = dir.child("valid.nq");
    valid.write_str(DATA)?;
    let invalid = dir.child("invalid.nq");
    invalid.write_str("<http://example.com/s> <http://example.com/p> .\n")?;
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(invalid.path())
        .arg("--file")
        .arg(dir.child("missing.nq").path())
        .arg("--file")
        .arg(valid.path())
        .arg("--lang")
        .arg("en")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\"@en"))
        .stderr(predicate::str::contains("Skipping source"))
        .stderr(predicate::str::contains("invalid.nq"))
        .stderr(predicate::str::contains("missing.nq"));
    Ok(())
}

#[test]
fn cli_filter_without_readable_source() -> Result<()> {
    let dir = TempDir::new()?;
    cli_command()
        .arg("filter")
        .arg("--file")
        .arg(dir.child("missing.nq").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could be read"));
    Ok(())
}

#[test]
fn cli_filter_json_logs() -> Result<()> {
    let dir = TempDir::new()?;
    cli_command()
        .arg("--log-format")
        .arg("json")
        .arg("filter")
        .arg("--file")
        .arg(dir.child("missing.nq").path())
        .arg("--file")
        .arg(dir.child("data").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"level\":\"WARN\""));
    Ok(())
}
