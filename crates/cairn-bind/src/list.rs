//! `ListOf<T>`: a list whose elements all bind to `T`.

use std::fmt;
use std::marker::PhantomData;

use cairn_value::{List, Value, ValueResult};

use crate::binding::Binding;

/// Typed view over a persistent [`List`].
///
/// Elements are stored as values and converted on access. Construction from
/// an untyped value checks every element once.
pub struct ListOf<T> {
    list: List,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ListOf<T> {
    fn clone(&self) -> Self {
        Self::wrap(self.list.clone())
    }
}

impl<T> ListOf<T> {
    fn wrap(list: List) -> Self {
        Self {
            list,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn as_list(&self) -> &List {
        &self.list
    }

    pub fn into_list(self) -> List {
        self.list
    }
}

impl<T: Binding> ListOf<T> {
    pub fn new() -> Self {
        Self::wrap(List::new())
    }

    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a T>) -> Self
    where
        T: 'a,
    {
        Self::wrap(List::from_values(items.into_iter().map(Binding::to_value)))
    }

    pub fn get(&self, index: usize) -> ValueResult<T> {
        T::from_value(self.list.get(index)?.clone())
    }

    pub fn set(&self, index: usize, item: &T) -> ValueResult<Self> {
        Ok(Self::wrap(self.list.set(index, item.to_value())?))
    }

    pub fn append<'a>(&self, items: impl IntoIterator<Item = &'a T>) -> Self
    where
        T: 'a,
    {
        Self::wrap(self.list.append(items.into_iter().map(Binding::to_value)))
    }

    pub fn push(&self, item: &T) -> Self {
        Self::wrap(self.list.push(item.to_value()))
    }

    pub fn insert<'a>(&self, index: usize, items: impl IntoIterator<Item = &'a T>) -> ValueResult<Self>
    where
        T: 'a,
    {
        Ok(Self::wrap(
            self.list
                .insert(index, items.into_iter().map(Binding::to_value))?,
        ))
    }

    pub fn remove(&self, start: usize, end: usize) -> ValueResult<Self> {
        Ok(Self::wrap(self.list.remove(start, end)?))
    }

    pub fn remove_at(&self, index: usize) -> ValueResult<Self> {
        Ok(Self::wrap(self.list.remove_at(index)?))
    }

    pub fn slice(&self, start: usize, end: usize) -> ValueResult<Self> {
        Ok(Self::wrap(self.list.slice(start, end)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueResult<T>> + '_ {
        self.list.iter().map(|v| T::from_value(v.clone()))
    }

    /// Visits elements until `f` returns `true`; reports whether it stopped.
    pub fn iter_until(&self, mut f: impl FnMut(T, usize) -> bool) -> ValueResult<bool> {
        for (i, item) in self.iter().enumerate() {
            if f(item?, i) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn iter_all(&self, mut f: impl FnMut(T, usize)) -> ValueResult<()> {
        for (i, item) in self.iter().enumerate() {
            f(item?, i);
        }
        Ok(())
    }

    pub fn filter(&self, mut keep: impl FnMut(&T, usize) -> bool) -> ValueResult<Self> {
        let mut kept = Vec::new();
        for (i, value) in self.list.iter().enumerate() {
            let item = T::from_value(value.clone())?;
            if keep(&item, i) {
                kept.push(value.clone());
            }
        }
        Ok(Self::wrap(List::from_values_with_config(kept, self.list.config())))
    }
}

impl<T: Binding> Default for ListOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Binding> Binding for ListOf<T> {
    fn from_value(value: Value) -> ValueResult<Self> {
        let list = value.as_list()?.clone();
        for item in list.iter() {
            T::from_value(item.clone())?;
        }
        Ok(Self::wrap(list))
    }

    fn to_value(&self) -> Value {
        Value::List(self.list.clone())
    }

    fn value_ref(&self) -> cairn_ref::Ref {
        self.list.value_ref()
    }
}

impl<T> PartialEq for ListOf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<T> Eq for ListOf<T> {}

impl<T> fmt::Debug for ListOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.list, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_value::ValueError;

    fn words(items: &[&str]) -> ListOf<String> {
        let owned: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        ListOf::from_items(&owned)
    }

    #[test]
    fn typed_access() {
        let list = words(&["a", "b", "c"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1).unwrap(), "b");
        assert!(matches!(
            list.get(3),
            Err(ValueError::OutOfBounds { index: 3, len: 3 })
        ));
        let updated = list.set(1, &"B".to_string()).unwrap();
        assert_eq!(updated.get(1).unwrap(), "B");
        assert_eq!(list.get(1).unwrap(), "b");
    }

    #[test]
    fn structural_edits() {
        let list = words(&["a", "d"]);
        let list = list
            .insert(1, &["b".to_string(), "c".to_string()])
            .unwrap()
            .push(&"e".to_string());
        let collected: Vec<String> = list.iter().collect::<ValueResult<_>>().unwrap();
        assert_eq!(collected, vec!["a", "b", "c", "d", "e"]);

        assert_eq!(list.remove_at(4).unwrap(), list.slice(0, 4).unwrap());
        assert_eq!(list.remove(1, 3).unwrap(), words(&["a", "d", "e"]));
        assert!(words(&[]).slice(0, 0).unwrap().is_empty());
    }

    #[test]
    fn iteration_and_filter() {
        let list: ListOf<u32> = ListOf::from_items(&[1, 2, 3, 4, 5]);
        let mut seen = Vec::new();
        let stopped = list
            .iter_until(|x, _| {
                seen.push(x);
                x == 3
            })
            .unwrap();
        assert!(stopped);
        assert_eq!(seen, vec![1, 2, 3]);

        let mut total = 0;
        list.iter_all(|x, _| total += x).unwrap();
        assert_eq!(total, 15);

        let odd = list.filter(|x, _| x % 2 == 1).unwrap();
        assert_eq!(odd, ListOf::from_items(&[1, 3, 5]));
    }

    #[test]
    fn from_value_checks_elements() {
        let mixed = Value::from(List::from_values([Value::from(1u32), Value::from("x")]));
        assert!(ListOf::<u32>::from_value(mixed).is_err());
        assert!(ListOf::<u32>::from_value(Value::from(1u32)).is_err());

        let list: ListOf<u32> = ListOf::from_items(&[7, 8]);
        let back = ListOf::<u32>::from_value(list.to_value()).unwrap();
        assert!(back.equals(&list));
        assert_eq!(back.into_list().len(), 2);
    }
}
