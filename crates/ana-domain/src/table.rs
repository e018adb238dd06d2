//! Representación tabular de eventos.
//!
//! Tabla columnar de esquema fijo: columnas nombradas de `f64`, todas de la
//! misma longitud. El esquema es append-only a lo largo del pipeline: las
//! etapas sólo añaden columnas ([`EventTable::join`]), nunca eliminan ni
//! renombran las existentes. El orden de filas es significativo.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    n_rows: usize,
    columns: IndexMap<String, Vec<f64>>,
}

impl EventTable {
    /// Tabla vacía sin columnas ni filas.
    pub fn new() -> Self {
        Self { n_rows: 0, columns: IndexMap::new() }
    }

    /// Construye una tabla a partir de columnas ya pobladas. Todas deben
    /// tener la misma longitud.
    pub fn from_columns(columns: IndexMap<String, Vec<f64>>) -> Result<Self, DomainError> {
        let n_rows = columns.values().next().map(|c| c.len()).unwrap_or(0);
        for (name, values) in &columns {
            if values.len() != n_rows {
                return Err(DomainError::SchemaMismatch(format!("column '{}' has {} rows, expected {}",
                                                               name,
                                                               values.len(),
                                                               n_rows)));
            }
        }
        Ok(Self { n_rows, columns })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Nombres de columna en orden de inserción.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64], DomainError> {
        self.columns
            .get(name)
            .map(|c| c.as_slice())
            .ok_or_else(|| DomainError::UnknownColumn(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut [f64], DomainError> {
        self.columns
            .get_mut(name)
            .map(|c| c.as_mut_slice())
            .ok_or_else(|| DomainError::UnknownColumn(name.to_string()))
    }

    pub fn value(&self, name: &str, row: usize) -> Result<f64, DomainError> {
        let column = self.column(name)?;
        column.get(row)
              .copied()
              .ok_or_else(|| DomainError::Validation(format!("row {} out of range for column '{}' ({} rows)",
                                                             row, name, column.len())))
    }

    /// Subtabla con las filas `[start, end)`, mismas columnas.
    pub fn slice(&self, start: usize, end: usize) -> Result<EventTable, DomainError> {
        if start > end || end > self.n_rows {
            return Err(DomainError::Validation(format!("bad slice [{}, {}) for table with {} rows",
                                                       start, end, self.n_rows)));
        }
        let columns = self.columns
                          .iter()
                          .map(|(name, values)| (name.clone(), values[start..end].to_vec()))
                          .collect();
        Ok(Self { n_rows: end - start, columns })
    }

    /// Subsecuencia ordenada de filas según `indexes`.
    pub fn select(&self, indexes: &[usize]) -> Result<EventTable, DomainError> {
        if let Some(&bad) = indexes.iter().find(|&&i| i >= self.n_rows) {
            return Err(DomainError::Validation(format!("row index {} out of range ({} rows)", bad, self.n_rows)));
        }
        let columns = self.columns
                          .iter()
                          .map(|(name, values)| {
                              (name.clone(), indexes.iter().map(|&i| values[i]).collect())
                          })
                          .collect();
        Ok(Self { n_rows: indexes.len(), columns })
    }

    /// Une dos tablas fila a fila añadiendo las columnas de `other`. Ambas
    /// deben tener el mismo número de filas y columnas disjuntas.
    pub fn join(&self, other: &EventTable) -> Result<EventTable, DomainError> {
        if self.n_rows != other.n_rows {
            return Err(DomainError::SchemaMismatch(format!("cannot join tables with {} and {} rows",
                                                           self.n_rows, other.n_rows)));
        }
        let mut columns = self.columns.clone();
        for (name, values) in &other.columns {
            if columns.insert(name.clone(), values.clone()).is_some() {
                return Err(DomainError::SchemaMismatch(format!("duplicate column '{}' in join", name)));
            }
        }
        Ok(Self { n_rows: self.n_rows, columns })
    }

    /// Concatena tablas en el orden dado. Todas deben compartir el mismo
    /// conjunto de columnas; el orden de columnas resultante es el de la
    /// primera tabla.
    pub fn concat(parts: &[EventTable]) -> Result<EventTable, DomainError> {
        let Some(first) = parts.first() else {
            return Ok(EventTable::new());
        };
        let mut columns: IndexMap<String, Vec<f64>> =
            first.columns.keys().map(|k| (k.clone(), Vec::new())).collect();
        let mut n_rows = 0;
        for part in parts {
            if part.columns.len() != columns.len()
               || !part.columns.keys().all(|k| columns.contains_key(k))
            {
                return Err(DomainError::SchemaMismatch(format!("column sets disagree: [{}] vs [{}]",
                                                               join_names(first),
                                                               join_names(part))));
            }
            for (name, values) in &mut columns {
                values.extend_from_slice(&part.columns[name.as_str()]);
            }
            n_rows += part.n_rows;
        }
        Ok(Self { n_rows, columns })
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::new()
    }
}

fn join_names(table: &EventTable) -> String {
    table.column_names().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn table() -> EventTable {
        EventTable::from_columns(indexmap! {
            "value".to_string() => vec![0.0, 1.0, 2.0, 3.0],
            "weight".to_string() => vec![1.0, 1.0, 0.5, 0.5],
        }).unwrap()
    }

    #[test]
    fn from_columns_rejects_ragged_lengths() {
        let result = EventTable::from_columns(indexmap! {
            "a".to_string() => vec![1.0],
            "b".to_string() => vec![1.0, 2.0],
        });
        assert!(matches!(result, Err(DomainError::SchemaMismatch(_))));
    }

    #[test]
    fn slice_and_select_preserve_order() {
        let t = table();
        let s = t.slice(1, 3).unwrap();
        assert_eq!(s.column("value").unwrap(), &[1.0, 2.0]);

        let sel = t.select(&[3, 0]).unwrap();
        assert_eq!(sel.column("value").unwrap(), &[3.0, 0.0]);
        assert_eq!(sel.column("weight").unwrap(), &[0.5, 1.0]);
    }

    #[test]
    fn join_appends_columns_only() {
        let t = table();
        let derived = EventTable::from_columns(indexmap! {
            "double".to_string() => vec![0.0, 2.0, 4.0, 6.0],
        }).unwrap();
        let joined = t.join(&derived).unwrap();
        assert_eq!(joined.n_columns(), 3);
        assert_eq!(joined.column("double").unwrap(), &[0.0, 2.0, 4.0, 6.0]);

        // columnas duplicadas no se permiten
        assert!(t.join(&t).is_err());
    }

    #[test]
    fn concat_requires_matching_schema() {
        let t = table();
        let joined = EventTable::concat(&[t.clone(), t.clone()]).unwrap();
        assert_eq!(joined.n_rows(), 8);

        let other = EventTable::from_columns(indexmap! {
            "value".to_string() => vec![9.0],
        }).unwrap();
        assert!(matches!(EventTable::concat(&[t, other]),
                         Err(DomainError::SchemaMismatch(_))));
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let t = EventTable::concat(&[]).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.n_columns(), 0);
    }
}
