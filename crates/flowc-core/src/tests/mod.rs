/*! Test coverage for core IR operations.
 *
 * The builder and verifier carry the structural guarantees the code generator relies on,
 * so they get exercised directly: block construction, entry allocation placement, phi
 * wiring, and every class of malformed function the verifier must reject.
 */

mod builder_api_tests;
mod verify_tests;
