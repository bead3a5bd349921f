//! Column selection for rows and records.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use flux_core::{Error, Record, Result, Value};

/// Function computing a value from a list of cells.
pub type CellFn = Box<dyn Fn(&[Value]) -> Value>;

/// One output column of a row projection.
pub enum Selector {
    /// Copy the cell at this index.
    Index(usize),
    /// Splice in every cell of the row (`'*'`).
    All,
    /// Compute a cell from the whole row.
    Row(CellFn),
    /// Compute a cell from the cells at the given indices.
    Derived(CellFn, Vec<usize>),
}

impl Selector {
    pub fn row<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Selector::Row(Box::new(f))
    }

    pub fn derived<F>(f: F, indices: Vec<usize>) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Selector::Derived(Box::new(f), indices)
    }

    /// `"*"` or a column index.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let descriptor = descriptor.trim();
        if descriptor == "*" {
            return Ok(Selector::All);
        }
        descriptor
            .parse::<usize>()
            .map(Selector::Index)
            .map_err(|_| Error::Argument(format!("bad row selector '{descriptor}'")))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(i) => write!(f, "Index({i})"),
            Selector::All => f.write_str("All"),
            Selector::Row(_) => f.write_str("Row(<fn>)"),
            Selector::Derived(_, idx) => write!(f, "Derived(<fn>, {idx:?})"),
        }
    }
}

fn cell(row: &[Value], idx: usize) -> Result<&Value> {
    row.get(idx).ok_or_else(|| {
        Error::Argument(format!(
            "column index {idx} out of range for row of {} cells",
            row.len()
        ))
    })
}

/// Apply `selectors` to one row.
pub fn project_row(selectors: &[Selector], row: &[Value]) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(selectors.len());
    for selector in selectors {
        match selector {
            Selector::Index(i) => out.push(cell(row, *i)?.clone()),
            Selector::All => out.extend(row.iter().cloned()),
            Selector::Row(f) => out.push(f(row)),
            Selector::Derived(f, indices) => {
                let args = indices
                    .iter()
                    .map(|i| cell(row, *i).cloned())
                    .collect::<Result<Vec<_>>>()?;
                out.push(f(&args));
            }
        }
    }
    Ok(out)
}

struct Computed {
    name: String,
    sources: Vec<String>,
    func: CellFn,
}

/// Builder for a record projection: plain fields, `'*'`, and computed fields
/// that may read input fields or other computed fields.
#[derive(Default)]
pub struct RecordSelect {
    fields: Vec<String>,
    computed: Vec<Computed>,
}

impl RecordSelect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy one input field (`"*"` copies every input field).
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add `name = func(sources...)`.
    pub fn compute<F>(mut self, name: impl Into<String>, sources: &[&str], func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.computed.push(Computed {
            name: name.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            func: Box::new(func),
        });
        self
    }

    /// Order computed fields so each is evaluated after the computed fields
    /// it reads. Ties keep declaration order.
    pub fn plan(self) -> Result<RecordProjection> {
        let index: HashMap<&str, usize> = self
            .computed
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect();
        if index.len() != self.computed.len() {
            return Err(Error::Argument("computed field declared twice".into()));
        }

        let n = self.computed.len();
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, c) in self.computed.iter().enumerate() {
            for source in &c.sources {
                if let Some(&dep) = index.get(source.as_str()) {
                    indegree[i] += 1;
                    dependents[dep].push(i);
                }
            }
        }

        let mut ready: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_front() {
            order.push(i);
            for &next in &dependents[i] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }
        if order.len() < n {
            let stuck: Vec<&str> = (0..n)
                .filter(|&i| indegree[i] > 0)
                .map(|i| self.computed[i].name.as_str())
                .collect();
            return Err(Error::Argument(format!(
                "computed fields form a cycle: {stuck:?}"
            )));
        }
        drop(index);

        let mut slots: Vec<Option<Computed>> = self.computed.into_iter().map(Some).collect();
        let ordered = order.into_iter().filter_map(|i| slots[i].take()).collect();
        Ok(RecordProjection {
            fields: self.fields,
            computed: ordered,
        })
    }
}

/// A validated, evaluation-ordered record projection.
pub struct RecordProjection {
    fields: Vec<String>,
    computed: Vec<Computed>,
}

impl RecordProjection {
    pub fn apply(&self, record: &Record) -> Record {
        let mut values = Record::new();
        for c in &self.computed {
            let args: Vec<Value> = c
                .sources
                .iter()
                .map(|s| {
                    values
                        .get(s)
                        .or_else(|| record.get(s))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();
            let v = (c.func)(&args);
            values.insert(c.name.clone(), v);
        }

        let mut out = Record::new();
        for field in &self.fields {
            if field == "*" {
                out.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));
            } else {
                let v = record.get(field).cloned().unwrap_or(Value::Null);
                out.insert(field.clone(), v);
            }
        }
        out.extend(values);
        out
    }
}
