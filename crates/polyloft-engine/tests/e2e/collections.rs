//! Arrays, map literals, strings, the List / Set / Map / Deque collections,
//! tuples and pairs

use super::harness::*;

// ============================================================================
// Arrays and map literals
// ============================================================================

#[test]
fn test_array_indexing_and_mutation() {
    expect_int("let xs = [1, 2, 3]\nxs[1] = 20\nxs.push(4)\nxs[1] + xs[3]", 24);
}

#[test]
fn test_array_index_out_of_range() {
    expect_error_contains("[1, 2][5]", "index 5 out of range for length 2");
}

#[test]
fn test_array_higher_order_methods() {
    expect_int(
        "let xs = [1, 2, 3, 4]
         xs.map((x) => x * 10).filter((x) => x > 15).reduce((acc, x) => acc + x, 0)",
        90,
    );
}

#[test]
fn test_array_sort_with_comparator() {
    expect_str(
        "let xs = [3, 1, 2]
         xs.sort((a, b) => b - a)
         xs.join(\"-\")",
        "3-2-1",
    );
}

#[test]
fn test_map_literal_methods() {
    expect_str(
        "let m = {\"a\": 1}
         m.set(\"b\", 2)
         m[\"c\"] = 3
         str(m.size()) + \" \" + m.get(\"z\", 0) + \" \" + m.has(\"b\") + \" \" + m.keys().join(\"\")",
        "3 0 true abc",
    );
}

#[test]
fn test_map_to_string() {
    expect_output("println({\"a\": [1, 2], \"b\": nil})", "{a: [1, 2], b: nil}\n");
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_methods() {
    expect_str(
        "let s = \"Hello, World\"
         s.toUpperCase().substring(0, 5) + s.length() + s.charAt(7)",
        "HELLO12W",
    );
}

#[test]
fn test_string_iteration() {
    expect_int("var n = 0\nfor c in \"abc\":\n n += 1\nend\nn", 3);
}

// ============================================================================
// Typed collections
// ============================================================================

#[test]
fn test_list_basics() {
    expect_int(
        "let xs = List<Int>(1, 2, 3)
         xs.add(4)
         xs.set(0, 10)
         xs.get(0) + xs.size()",
        14,
    );
}

#[test]
fn test_list_rejects_wrong_element_type() {
    expect_error_contains(
        "let xs = List<Int>()\nxs.add(\"x\")",
        "List<Int> element: expected Int, got String",
    );
}

#[test]
fn test_list_from_array() {
    expect_str("List([3, 1, 2]).toString()", "[3, 1, 2]");
}

#[test]
fn test_untyped_list_accepts_anything() {
    expect_int("let xs = List()\nxs.add(1, \"a\", nil)\nxs.size()", 3);
}

#[test]
fn test_set_deduplicates() {
    expect_str(
        "let s = Set<String>()
         let first = s.add(\"a\")
         let again = s.add(\"a\")
         s.add(\"b\")
         str(first) + \" \" + again + \" \" + s.size()",
        "true false 2",
    );
}

#[test]
fn test_typed_map() {
    expect_int(
        "let m = Map<String, Int>()
         m.put(\"one\", 1)
         m.put(\"two\", 2)
         m.get(\"one\") + m.get(\"two\") + m.size()",
        5,
    );
    expect_error_contains(
        "let m = Map<String, Int>()\nm.put(1, 1)",
        "Map<String, Int> key: expected String, got Int",
    );
}

#[test]
fn test_deque_operations() {
    expect_str(
        "let d = Deque<Int>()
         d.addLast(2)
         d.addFirst(1)
         d.addLast(3)
         str(d.removeFirst()) + str(d.removeLast()) + str(d.peekFirst()) + d.size()",
        "1321",
    );
}

#[test]
fn test_collection_iteration() {
    expect_int(
        "var total = 0
         for x in List<Int>(1, 2, 3):
             total += x
         end
         total",
        6,
    );
}

#[test]
fn test_collection_type_argument_count() {
    expect_error_contains("List<Int, String>()", "List expects 1 type argument(s), got 2");
}

// ============================================================================
// Tuples and pairs
// ============================================================================

#[test]
fn test_tuple_holds_mixed_values() {
    expect_str(
        "let t = Tuple(1, \"two\", 3.5)
         str(t.size()) + \" \" + t.get(1) + \" \" + t",
        "3 two (1, two, 3.5)",
    );
}

#[test]
fn test_tuple_index_out_of_bounds_is_catchable() {
    expect_str(
        "let t = Tuple(1, 2)
         var got = \"\"
         try
             t.get(2)
         catch e: IndexError
             got = e.getMessage()
         end
         got",
        "index out of bounds: 2 (size: 2)",
    );
}

#[test]
fn test_tuple_to_array_is_a_copy() {
    expect_str(
        "let t = Tuple(1, 2)
         let xs = t.toArray()
         xs.push(3)
         str(t) + \" \" + xs.length()",
        "(1, 2) 3",
    );
}

#[test]
fn test_tuple_elements_cannot_be_replaced() {
    expect_error_contains("let t = Tuple(1)\nt.elements = [2]", "cannot access private member 'elements'");
}

#[test]
fn test_pair_accessors() {
    expect_str(
        "let p = Pair(\"a\", 1)
         p.setValue(2)
         p.getKey() + \" \" + p.getValue() + \" \" + p",
        "a 2 a=2",
    );
}

#[test]
fn test_pair_key_is_final() {
    expect_error_contains("let p = Pair(\"a\", 1)\np.key = \"b\"", "cannot assign to final field 'key'");
}

#[test]
fn test_pair_value_type_is_checked() {
    expect_error_contains("Pair<String, Int>(\"a\", 1).setValue(\"x\")", "expected Int, got String");
}
