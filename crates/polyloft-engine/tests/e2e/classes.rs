//! Classes, inheritance, interfaces, sealed hierarchies, enums and records

use super::harness::*;

// ============================================================================
// Classes and inheritance
// ============================================================================

#[test]
fn test_class_fields_and_methods() {
    expect_int(
        "class Counter:
             var count: Int = 0
             def increment():
                 this.count = this.count + 1
                 return this
             end
         end
         let c = Counter()
         c.increment().increment().increment()
         c.count",
        3,
    );
}

#[test]
fn test_constructor_overloads() {
    expect_str(
        "class Point:
             var x = 0
             var y = 0
             Point():
             end
             Point(x, y):
                 this.x = x
                 this.y = y
             end
             def toString() = \"(\" + this.x + \", \" + this.y + \")\"
         end
         str(Point()) + \" \" + str(Point(3, 4))",
        "(0, 0) (3, 4)",
    );
}

#[test]
fn test_no_matching_constructor() {
    expect_error_contains(
        "class Empty\nend\nEmpty(1, 2)",
        "no constructor found for Empty with 2 arguments",
    );
}

#[test]
fn test_inheritance_and_super() {
    expect_str(
        "class Animal:
             var name = \"\"
             Animal(name):
                 this.name = name
             end
             def speak() = this.name + \" makes a sound\"
         end
         class Dog < Animal:
             Dog(name):
                 super(name)
             end
             def speak() = super.speak() + \" (woof)\"
         end
         Dog(\"Rex\").speak()",
        "Rex makes a sound (woof)",
    );
}

#[test]
fn test_instanceof_follows_hierarchy() {
    expect_bool(
        "class A\nend\nclass B < A\nend\nlet b = B()\n(b instanceof A) && !(A() instanceof B)",
        true,
    );
}

#[test]
fn test_private_field_access_is_rejected() {
    expect_error_contains(
        "class Safe:
             private var secret = 42
         end
         Safe().secret",
        "cannot access private member 'secret'",
    );
}

#[test]
fn test_abstract_class_cannot_be_instantiated() {
    expect_error_contains(
        "abstract class Shape:
             abstract def area() -> Float
         end
         Shape()",
        "cannot instantiate abstract class Shape",
    );
}

#[test]
fn test_static_members() {
    expect_int(
        "class Registry:
             static var count: Int = 0
             static def register():
                 Registry.count = Registry.count + 1
                 return Registry.count
             end
         end
         Registry.register()
         Registry.register()",
        2,
    );
}

#[test]
fn test_user_to_string_used_by_println() {
    expect_output(
        "class Greeting:
             def toString() = \"hello\"
         end
         println(Greeting())",
        "hello\n",
    );
}

// ============================================================================
// Interfaces and sealed types
// ============================================================================

#[test]
fn test_interface_default_method() {
    expect_str(
        "interface Named:
             def name() -> String
             def greet():
                 return \"hi \" + this.name()
             end
         end
         class User implements Named:
             def name() = \"ann\"
         end
         User().greet()",
        "hi ann",
    );
}

#[test]
fn test_missing_interface_method() {
    expect_error_contains(
        "interface Named:
             def name() -> String
         end
         class Anonymous implements Named
         end",
        "class Anonymous must implement abstract method 'name' of interface Named",
    );
}

#[test]
fn test_sealed_interface_rejects_unpermitted_class() {
    expect_error_contains(
        "sealed interface Lockable(SafeBox)
             def lock() -> Bool
         end
         class Vault implements Lockable:
             def lock() = true
         end",
        "sealed",
    );
    expect_error_contains(
        "sealed interface Lockable(SafeBox)
             def lock() -> Bool
         end
         class Vault implements Lockable:
             def lock() = true
         end",
        "permit",
    );
}

#[test]
fn test_sealed_class_allows_permitted_subclass() {
    expect_bool(
        "sealed class Shape(Circle, Square)
         end
         class Circle < Shape
         end
         Circle() instanceof Shape",
        true,
    );
}

#[test]
fn test_sealed_class_rejects_other_subclass() {
    expect_error_contains(
        "sealed class Shape(Circle)
         end
         class Triangle < Shape
         end",
        "does not permit Triangle",
    );
}

// ============================================================================
// Enums and records
// ============================================================================

#[test]
fn test_enum_constants() {
    expect_str(
        "enum Color
             RED, GREEN, BLUE
         end
         Color.GREEN.name() + \":\" + Color.GREEN.ordinal() + \":\" + len(Color.values())",
        "GREEN:1:3",
    );
}

#[test]
fn test_enum_with_constructor_and_value_of() {
    expect_int(
        "enum Planet
             MERCURY(1), VENUS(2)
             var order: Int = 0
             Planet(o: Int):
                 this.order = o
             end
         end
         Planet.valueOf(\"VENUS\").order",
        2,
    );
}

#[test]
fn test_record_components() {
    expect_int(
        "record Point(x: Int, y: Int)
             def sum() = x + y
         end
         let p = Point(3, 4)
         p.sum() + p.x",
        10,
    );
}

#[test]
fn test_record_component_types_are_checked() {
    expect_error_contains(
        "record Point(x: Int, y: Int)\nend\nPoint(1, \"two\")",
        "component 'y' of Point: expected Int, got String",
    );
}

#[test]
fn test_record_equality_and_rendering() {
    expect_str(
        "record Point(x: Int, y: Int)\nend\nstr(Point(1, 2)) + \" \" + (Point(1, 2) == Point(1, 2))",
        "Point(x=1, y=2) true",
    );
}

#[test]
fn test_record_components_are_immutable() {
    expect_error_contains(
        "record Point(x: Int, y: Int)\nend\nlet p = Point(1, 2)\np.x = 5",
        "cannot assign to record component 'x'",
    );
}
