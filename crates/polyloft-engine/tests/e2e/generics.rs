//! Generic classes, bounds, variance and runtime type tests

use super::harness::*;

const BOX: &str = "class Box<T>:
    var value: T
    Box(v: T):
        this.value = v
    end
    def get() -> T = this.value
    def set(v: T):
        this.value = v
    end
end
";

#[test]
fn test_generic_class_round_trip() {
    expect_str(
        &format!("{}let b = Box<String>(\"hello\")\nb.set(\"world\")\nb.get()", BOX),
        "world",
    );
}

#[test]
fn test_generic_argument_mismatch_names_bound_type() {
    expect_error_contains(
        &format!("{}Box<String>(\"hello\").set(42)", BOX),
        "String",
    );
    expect_error_contains(
        &format!("{}Box<String>(\"hello\").set(42)", BOX),
        "expected String, got Int",
    );
}

#[test]
fn test_type_arguments_inferred_from_constructor() {
    expect_error_contains(&format!("{}Box(1).set(\"one\")", BOX), "expected Int, got String");
}

#[test]
fn test_wrong_type_argument_count() {
    expect_error_contains(
        &format!("{}Box<Int, String>(1)", BOX),
        "Box expects 1 type argument(s), got 2",
    );
}

#[test]
fn test_bound_checked_at_construction() {
    let source = "class NumBox<T extends Number>:
                      var value: T
                      NumBox(v: T):
                          this.value = v
                      end
                  end
                  ";
    expect_int(&format!("{}NumBox<Int>(5).value", source), 5);
    expect_error_contains(
        &format!("{}NumBox<String>(\"x\")", source),
        "does not satisfy constraint",
    );
}

#[test]
fn test_covariant_parameter_in_input_position() {
    let (result, _) = run_capturing(
        "class Producer<out T>:
             def set(v: T):
             end
         end",
    );
    let message = result.expect_err("declaration should fail").to_string();
    assert!(message.contains("covariant"), "got: {}", message);
    assert!(message.contains("out"), "got: {}", message);
}

#[test]
fn test_covariant_parameter_in_output_position_is_allowed() {
    expect_int(
        "class Source<out T>:
             var item: T
             Source(item: T):
                 this.item = item
             end
             def get() -> T = this.item
         end
         Source<Int>(7).get()",
        7,
    );
}

#[test]
fn test_contravariant_parameter_in_return_position() {
    expect_error_contains(
        "class Sink<in T>:
             var last: T
             def get() -> T = this.last
         end",
        "contravariant type parameter 'T' (declared with 'in') cannot be used in return position of method 'get'",
    );
}

#[test]
fn test_contravariant_parameter_in_input_position_is_allowed() {
    expect_int(
        "class Sink<in T>:
             var count: Int = 0
             def put(v: T):
                 this.count += 1
             end
         end
         let s = Sink<Int>()
         s.put(1)
         s.put(2)
         s.count",
        2,
    );
}

#[test]
fn test_record_variance_is_checked() {
    expect_error_contains(
        "record R<out T>(v: T)
             def with(x: T) = R(x)
         end",
        "covariant type parameter 'T' (declared with 'out') cannot be used in parameter position of method 'with'",
    );
}

#[test]
fn test_record_covariant_component_is_allowed() {
    expect_int("record R<out T>(v: T)\n    def get() -> T = v\nend\nR<Int>(3).get()", 3);
}

#[test]
fn test_generic_function_bound() {
    expect_int(
        "def biggest<T extends Number>(a: T, b: T) -> T:
             return a > b ? a : b
         end
         biggest(3, 8)",
        8,
    );
    expect_error_contains(
        "def biggest<T extends Number>(a: T, b: T) -> T:
             return a
         end
         biggest(\"a\", \"b\")",
        "does not satisfy constraint",
    );
}

// ============================================================================
// instanceof
// ============================================================================

#[test]
fn test_instanceof_wildcard_matches_any_list() {
    expect_bool(
        "let xs = List<Int>(1, 2)
         let ys = List(\"a\")
         instanceof(xs, \"List<?>\") && instanceof(ys, \"List<?>\")",
        true,
    );
}

#[test]
fn test_instanceof_call_after_binding() {
    expect_bool("let xs = List<Int>(1, 2)\ninstanceof(xs, \"List<?>\")", true);
}

#[test]
fn test_instanceof_exact_element_type() {
    expect_bool("instanceof(List<String>(\"a\"), \"List<String>\")", true);
    expect_bool("instanceof(List<Int>(1), \"List<String>\")", false);
    expect_bool("instanceof(List(\"a\", \"b\"), \"List<String>\")", true);
}

#[test]
fn test_instanceof_operator_with_generic_type() {
    expect_bool("List<Int>(1) instanceof List<? extends Number>", true);
    expect_bool("List<String>(\"a\") instanceof List<? extends Number>", false);
}

#[test]
fn test_sys_type_renders_generic_instances() {
    expect_str(&format!("{}Sys.type(Box<Int>(1))", BOX), "Box<Int>");
}

#[test]
fn test_sys_type_shows_variance() {
    expect_str(
        "class Source<out T>:
             var item: T
             Source(item: T):
                 this.item = item
             end
         end
         Sys.type(Source<Int>(1))",
        "Source<out Int>",
    );
}

#[test]
fn test_instanceof_lower_bounded_wildcard() {
    let source = format!("{}class A\nend\nclass B < A\nend\n", BOX);
    expect_bool(&format!("{}instanceof(Box<A>(A()), \"Box<? super B>\")", source), true);
    expect_bool(&format!("{}instanceof(Box<B>(B()), \"Box<? super A>\")", source), false);
    expect_bool(&format!("{}Box<A>(B()) instanceof Box<? super B>", source), true);
}
