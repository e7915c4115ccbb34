use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use thiserror::Error;
use tracing::debug;

use super::cnf::{AddClause, Formula, Lit};

#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("failed to read cnf input")]
    Io(#[from] std::io::Error),
    #[error("line {line}: unsupported format '{found}', expected 'p cnf'")]
    Format { line: usize, found: String },
    #[error("line {line}: invalid header, expected: p cnf <vars> <clauses>")]
    Header { line: usize },
    #[error("line {line}: duplicate problem line")]
    DuplicateHeader { line: usize },
    #[error("line {line}: invalid literal '{token}'")]
    Literal { line: usize, token: String },
    #[error("line {line}: clause is missing its terminating 0")]
    MissingTerminator { line: usize },
}

pub fn parse_dimacs_str(s: &str) -> Result<Formula, DimacsError> {
    parse_dimacs_reader(std::io::Cursor::new(s.as_bytes()))
}

/// Reads DIMACS CNF into a [`Formula`]. Tautologies are dropped and repeated
/// clauses collapse to one; a line holding only `0` yields the empty clause.
pub fn parse_dimacs_reader<R: BufRead>(r: R) -> Result<Formula, DimacsError> {
    let mut formula = Formula::new(0);
    let mut header_seen = false;
    let mut declared_clauses = None::<usize>;
    let mut tautologies = 0usize;
    let mut duplicates = 0usize;

    for (idx, raw) in r.lines().enumerate() {
        let raw = raw?;
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        // SATLIB instances close with "%\n0"
        if line.starts_with('%') {
            break;
        }

        if line.starts_with('p') {
            if header_seen {
                return Err(DimacsError::DuplicateHeader { line: line_no });
            }
            let (num_vars, num_clauses) = parse_header(line, line_no)?;
            formula.declare_vars(num_vars);
            declared_clauses = Some(num_clauses);
            header_seen = true;
            continue;
        }

        let mut tokens = Vec::new();
        for token in line.split_whitespace() {
            let v = token.parse::<i64>().map_err(|_| DimacsError::Literal {
                line: line_no,
                token: token.to_string(),
            })?;
            tokens.push(v);
        }
        if tokens.last() != Some(&0) {
            return Err(DimacsError::MissingTerminator { line: line_no });
        }

        for chunk in tokens[..tokens.len() - 1].split(|&v| v == 0) {
            let mut lits = Vec::with_capacity(chunk.len());
            for &v in chunk {
                let lit = Lit::from_dimacs(v).ok_or_else(|| DimacsError::Literal {
                    line: line_no,
                    token: v.to_string(),
                })?;
                lits.push(lit);
            }
            match formula.add_clause(lits) {
                AddClause::Added => {}
                AddClause::Duplicate => duplicates += 1,
                AddClause::Tautology => tautologies += 1,
            }
        }
    }

    debug!(
        vars = formula.num_vars(),
        clauses = formula.len(),
        declared = ?declared_clauses,
        tautologies,
        duplicates,
        "parsed dimacs"
    );
    Ok(formula)
}

fn parse_header(line: &str, line_no: usize) -> Result<(u32, usize), DimacsError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts[0] != "p" {
        return Err(DimacsError::Header { line: line_no });
    }
    match parts.get(1) {
        Some(&"cnf") => {}
        Some(other) => {
            return Err(DimacsError::Format {
                line: line_no,
                found: other.to_string(),
            });
        }
        None => return Err(DimacsError::Header { line: line_no }),
    }
    if parts.len() != 4 {
        return Err(DimacsError::Header { line: line_no });
    }
    let num_vars = parts[2]
        .parse::<u32>()
        .map_err(|_| DimacsError::Header { line: line_no })?;
    let num_clauses = parts[3]
        .parse::<usize>()
        .map_err(|_| DimacsError::Header { line: line_no })?;
    Ok((num_vars, num_clauses))
}

/// Builds a formula from signed integer clauses, applying the same filtering
/// as the DIMACS loader.
pub fn from_int_clauses<C: AsRef<[i64]>>(clauses: &[C]) -> Result<Formula, DimacsError> {
    let mut formula = Formula::new(0);
    for (idx, clause) in clauses.iter().enumerate() {
        let mut lits = Vec::with_capacity(clause.as_ref().len());
        for &v in clause.as_ref() {
            let lit = Lit::from_dimacs(v).ok_or_else(|| DimacsError::Literal {
                line: idx + 1,
                token: v.to_string(),
            })?;
            lits.push(lit);
        }
        formula.add_clause(lits);
    }
    Ok(formula)
}

pub fn load_cnf<P: AsRef<Path>>(path: P) -> anyhow::Result<Formula> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_dimacs_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

pub fn to_dimacs(formula: &Formula) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", formula.num_vars(), formula.len()));
    for clause in formula.clauses() {
        for &lit in clause.lits() {
            out.push_str(&format!("{} ", lit.to_dimacs()));
        }
        out.push_str("0\n");
    }
    out
}

pub fn write_cnf<P: AsRef<Path>>(path: P, formula: &Formula) -> anyhow::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_dimacs(formula))
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{DimacsError, parse_dimacs_str, to_dimacs};
    use crate::cnf::cnf::{Clause, Lit};

    #[test]
    fn parse_filters_tautologies_and_duplicates() {
        let src = "\
c tiny
p cnf 3 4
1 -2 0
-2 1 0
2 -2 3 0
3 0
";
        let f = match parse_dimacs_str(src) {
            Ok(v) => v,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(f.num_vars(), 3);
        assert_eq!(f.len(), 2);
        let first = Clause::new([Lit::new(1, true), Lit::new(2, false)]).expect("clause");
        assert!(f.contains(&first));
    }

    #[test]
    fn zero_line_is_empty_clause() {
        let f = parse_dimacs_str("p cnf 1 2\n1 0\n0\n").expect("parse");
        assert!(f.has_empty_clause());
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn rejects_missing_terminator() {
        let err = parse_dimacs_str("p cnf 2 1\n1 2\n").expect_err("must fail");
        assert!(matches!(err, DimacsError::MissingTerminator { line: 2 }));
    }

    #[test]
    fn rejects_non_cnf_format() {
        let err = parse_dimacs_str("p dnf 2 1\n1 2 0\n").expect_err("must fail");
        assert!(matches!(err, DimacsError::Format { line: 1, .. }));
    }

    #[test]
    fn rejects_non_integer_token() {
        let err = parse_dimacs_str("p cnf 2 1\n1 x 0\n").expect_err("must fail");
        match err {
            DimacsError::Literal { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_second_header() {
        let err = parse_dimacs_str("p cnf 2 1\n1 2 0\np cnf 2 1\n").expect_err("must fail");
        assert!(matches!(err, DimacsError::DuplicateHeader { line: 3 }));
    }

    #[test]
    fn rejects_malformed_header() {
        for src in ["p cnf 3\n1 0\n", "p cnf x 1\n1 0\n", "p cnf 3 1 7\n1 0\n", "p\n"] {
            let err = parse_dimacs_str(src).expect_err("must fail");
            assert!(matches!(err, DimacsError::Header { line: 1 }), "{src:?}: {err}");
        }
    }

    #[test]
    fn internal_zeros_split_clauses() {
        let f = parse_dimacs_str("p cnf 2 2\n1 0 -2 0\n").expect("parse");
        assert_eq!(f.len(), 2);
        let first = Clause::new([Lit::new(1, true)]).expect("clause");
        let second = Clause::new([Lit::new(2, false)]).expect("clause");
        assert_eq!(f.clause(0), Some(&first));
        assert_eq!(f.clause(1), Some(&second));
    }

    #[test]
    fn stops_at_percent_trailer() {
        let f = parse_dimacs_str("p cnf 2 1\n1 2 0\n%\n0\n").expect("parse");
        assert_eq!(f.len(), 1);
        assert!(!f.has_empty_clause());
    }

    #[test]
    fn writer_output_parses_back() {
        let src = "p cnf 4 2\n1 -4 0\n2 3 0\n";
        let f = parse_dimacs_str(src).expect("parse");
        assert_eq!(to_dimacs(&f), src);
    }
}
