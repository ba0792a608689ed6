//! Variables, functions, closures, control flow and builtin functions

use super::harness::*;

// ============================================================================
// Bindings and arithmetic
// ============================================================================

#[test]
fn test_last_expression_is_result() {
    expect_int("let a = 40\nlet b = 2\na + b", 42);
}

#[test]
fn test_walrus_and_compound_assignment() {
    expect_int("x := 10\nx += 5\nx -= 3\nx", 12);
}

#[test]
fn test_const_cannot_be_reassigned() {
    expect_error_contains("const limit = 3\nlimit = 4", "cannot assign");
}

#[test]
fn test_typed_variable_rejects_wrong_type() {
    expect_error_contains("let n: Int = \"three\"", "expected Int, got String");
}

#[test]
fn test_integer_division_by_zero() {
    expect_error_contains("let z = 0\n10 / z", "division by zero");
}

#[test]
fn test_string_concatenation_and_repeat() {
    expect_str("\"n=\" + 3 + \"-\" * 2", "n=3--");
}

#[test]
fn test_leading_minus_starts_new_statement() {
    expect_int("let a = 5\n-1", -1);
    expect_int("let a = 5\n-1\na", 5);
}

#[test]
fn test_trailing_operator_continues_line() {
    expect_int("let a = 5 +\n    1\na", 6);
}

#[test]
fn test_oversized_string_repeat_fails() {
    expect_error_contains("\"ab\" * 4611686018427387904", "exceeds the maximum length");
    expect_error_contains("\"ab\" * 100000000", "string repeated 100000000 times");
    expect_str("\"ab\" * -2", "");
}

#[test]
fn test_oversized_range_fails() {
    expect_error_contains("let r = 0...100000000000", "range 0...100000000000");
    expect_error_contains("range(0, 9223372036854775807)", "exceeds the maximum length");
    expect_int("len(5...1)", 0);
    expect_int("len(range(0, 10, 3))", 4);
}

#[test]
fn test_ternary() {
    expect_str("let x = 5\nx > 3 ? \"big\" : \"small\"", "big");
}

// ============================================================================
// Functions and closures
// ============================================================================

#[test]
fn test_expression_function() {
    expect_int("def double(x) = x * 2\ndouble(21)", 42);
}

#[test]
fn test_recursive_function() {
    expect_int(
        "def fib(n: Int) -> Int:
             if n < 2:
                 return n
             end
             return fib(n - 1) + fib(n - 2)
         end
         fib(15)",
        610,
    );
}

#[test]
fn test_variadic_parameters() {
    expect_int(
        "def sum(first: Int, rest: Int...):
             var total = first
             for n in rest:
                 total += n
             end
             return total
         end
         sum(1, 2, 3, 4)",
        10,
    );
}

#[test]
fn test_closure_keeps_state() {
    expect_int(
        "def makeCounter():
             var count = 0
             return () => do
                 count = count + 1
                 return count
             end
         end
         let counter = makeCounter()
         counter()
         counter()
         counter()",
        3,
    );
}

#[test]
fn test_argument_type_is_checked() {
    expect_error_contains(
        "def square(n: Int) -> Int:\n return n * n\nend\nsquare(\"x\")",
        "argument 'n' of square: expected Int, got String",
    );
}

#[test]
fn test_return_type_is_checked() {
    expect_error_contains(
        "def name() -> String:\n return 5\nend\nname()",
        "return value of name",
    );
}

#[test]
fn test_recursion_limit() {
    expect_error_contains(
        "def down(n) = down(n + 1)\ndown(0)",
        "maximum recursion depth exceeded",
    );
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_elif_else() {
    expect_str(
        "def grade(n):
             if n >= 90:
                 return \"A\"
             elif n >= 80:
                 return \"B\"
             else
                 return \"C\"
             end
         end
         grade(95) + grade(85) + grade(10)",
        "ABC",
    );
}

#[test]
fn test_for_with_where_filter() {
    expect_int(
        "var total = 0
         for x in [1, 2, 3, 4, 5, 6] where x % 2 == 0:
             total += x
         end
         total",
        12,
    );
}

#[test]
fn test_for_over_map_entries() {
    expect_int(
        "var total = 0
         for k, v in {\"a\": 1, \"b\": 2}:
             total += v
         end
         total",
        3,
    );
}

#[test]
fn test_loop_with_condition_and_break() {
    expect_int(
        "var i = 0
         loop i < 100:
             i += 1
             if i == 7:
                 break
             end
         end
         i",
        7,
    );
}

#[test]
fn test_inclusive_range() {
    expect_int("var t = 0\nfor i in 1...4:\n t += i\nend\nt", 10);
}

#[test]
fn test_switch_values_and_types() {
    expect_str(
        "def describe(v):
             switch v
                 case 1, 2:
                     return \"small\"
                 case (s: String):
                     return \"text \" + s
                 default:
                     return \"other\"
             end
         end
         describe(2) + \",\" + describe(\"x\") + \",\" + describe(9)",
        "small,text x,other",
    );
}

// ============================================================================
// Builtin functions and modules
// ============================================================================

#[test]
fn test_println_joins_arguments() {
    expect_output("println(\"a\", 1, true)\nprint(\"b\")", "a 1 true\nb");
}

#[test]
fn test_string_interpolation() {
    expect_output(
        "let name = \"Poly\"\nlet n = 2\nprintln(\"Hello, #{name}! #{n + 1}\")",
        "Hello, Poly! 3\n",
    );
}

#[test]
fn test_conversions() {
    expect_int("int(\"41\") + int(1.9)", 42);
    expect_str("str(12) + str(nil)", "12nil");
    expect_bool("bool(0) || bool(\"\")", false);
}

#[test]
fn test_range_builtin() {
    expect_str("range(0, 10, 3).join(\",\")", "0,3,6,9");
    expect_int("len(range(5))", 5);
    expect_error_contains("range(0, 5, 0)", "step must not be zero");
}

#[test]
fn test_sys_and_math_modules() {
    expect_str("Sys.type(1) + \" \" + Sys.type(\"s\")", "Int String");
    expect_int("Math.max(3, 9, 4) - Math.min(3, 9, 4)", 6);
    expect_bool("Math.abs(-2.5) == 2.5", true);
}

#[test]
fn test_import_alias() {
    expect_int("import Math as M\nM.max(1, 2)", 2);
}

#[test]
fn test_undefined_name() {
    expect_error_contains("missing + 1", "name 'missing' is not defined");
}
