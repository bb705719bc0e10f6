///! Some utility functions

use std::path::PathBuf;

use minidom::Element;

use crate::sync::RunReport;

/// Walks an XML tree and returns every element that has the given (local) name
pub fn find_elems<S: AsRef<str>>(root: &Element, searched_name: S) -> Vec<&Element> {
    let searched_name = searched_name.as_ref();
    let mut elems: Vec<&Element> = Vec::new();

    for el in root.children() {
        if el.name() == searched_name {
            elems.push(el);
        } else {
            elems.extend(find_elems(el, searched_name));
        }
    }
    elems
}

/// Walks an XML tree until it finds an element with the given (local) name
pub fn find_elem<S: AsRef<str>>(root: &Element, searched_name: S) -> Option<&Element> {
    let searched_name = searched_name.as_ref();
    if root.name() == searched_name {
        return Some(root);
    }

    root.children().find_map(|el| find_elem(el, searched_name))
}

/// The home directory of the current user.
/// When it cannot be found, paths built from it end up relative to the working directory.
pub fn home_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home,
        None => {
            log::warn!("Unable to find the home directory, using the current directory instead");
            PathBuf::new()
        },
    }
}

/// A debug utility that pretty-prints the outcome of a run
pub fn print_report(report: &RunReport) {
    println!("{} contacts converted", report.converted);
    println!("{} contacts imported", report.imported);
    println!("{} skipped", report.skipped);
    println!("{} errors", report.errors.len());
    for error in &report.errors {
        println!("    * {}", error);
    }
}
