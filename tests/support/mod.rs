#![allow(dead_code)]

use std::panic;
use std::sync::Mutex;
use test_doubles::double;

/// Panic payload raised by [`LinkedList::get`] for a missing index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOutOfBounds {
    pub index: usize,
    pub size: usize,
}

pub trait List {
    fn add(&self, item: String) -> bool;
    fn clear(&self);
    fn get(&self, index: usize) -> Option<String>;
    fn size(&self) -> usize;
}

#[derive(Default)]
pub struct LinkedList {
    items: Mutex<Vec<String>>,
}

impl List for LinkedList {
    fn add(&self, item: String) -> bool {
        self.items.lock().unwrap().push(item);
        true
    }

    fn clear(&self) {
        self.items.lock().unwrap().clear();
    }

    fn get(&self, index: usize) -> Option<String> {
        let items = self.items.lock().unwrap();
        match items.get(index) {
            Some(item) => Some(item.clone()),
            None => {
                let size = items.len();
                drop(items);
                panic::panic_any(IndexOutOfBounds { index, size })
            }
        }
    }

    fn size(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

double! {
    pub struct ListDouble for List {
        fn add(&self, item: String) -> bool => false;
        fn clear(&self) => ();
        fn get(&self, index: usize) -> Option<String> => None;
        fn size(&self) -> usize => 0;
    }
}

pub fn mocked_list() -> ListDouble {
    ListDouble::mock_named("mockedList")
}

pub fn spied_list() -> ListDouble {
    ListDouble::spy_named("spy", LinkedList::default())
}
